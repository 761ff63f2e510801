//! Disk-backed end-to-end runs of the bundle operation.

use std::fs;
use std::path::Path;

use husk::ops::bundle::{self, BundleParams};
use husk_manifest::HuskToml;

const MANIFEST: &str = r#"
[project]
root = "src"
output = "declaration/api.d.ts"

[handlers]
dir = "handler"
base = "Route"
module = "@sora/framework"

[entities]
dir = "database"
base = "BaseModel"
module = "@sora/orm"

[[extra]]
file = "common/ServiceName.ts"
names = ["ServiceName"]
"#;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn scaffold(dir: &Path) {
    write(&dir.join("husk.toml"), MANIFEST);
    write(
        &dir.join("src/handler/AccountHandler.ts"),
        "import {Route} from '@sora/framework';\nimport {LoginReq, LoginRes} from '../types/account';\nexport class AccountHandler extends Route {\n  login(body: LoginReq, raw: Buffer): Promise<LoginRes> { return this.process(body); }\n}\n",
    );
    write(
        &dir.join("src/types/account.ts"),
        "export interface LoginReq {\n  username: string;\n}\nexport interface LoginRes {\n  token: string;\n}\nexport interface NeverUsed {\n  x: number;\n}\n",
    );
    write(
        &dir.join("src/database/Account.ts"),
        "import {BaseModel} from '@sora/orm';\n@Entity('account')\nexport class Account extends BaseModel {\n  @Column()\n  nickname: string;\n  private secret: string;\n}\n",
    );
    write(
        &dir.join("src/common/ServiceName.ts"),
        "export enum ServiceName {\n  Account = 'account',\n}\n",
    );
}

fn open_manifest(dir: &Path) -> HuskToml {
    HuskToml::open(dir.join("husk.toml")).expect("manifest should parse")
}

#[test]
fn test_bundle_writes_document() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold(tmp.path());
    let husk_toml = open_manifest(tmp.path());

    let report = bundle::run(
        husk_toml.manifest(),
        husk_toml.dir(),
        &BundleParams::default(),
    )
    .expect("bundle should succeed");

    let out_path = tmp.path().join("declaration/api.d.ts");
    assert_eq!(report.output_path.as_deref(), Some(out_path.as_path()));
    let document = fs::read_to_string(&out_path).unwrap();

    assert!(document.contains("// handler/AccountHandler.ts\n"), "got:\n{document}");
    assert!(document.contains("export declare class AccountHandler {"));
    assert!(document.contains("login(body: LoginReq): Promise<LoginRes>;"));
    assert!(document.contains("export interface LoginReq {"));
    assert!(document.contains("export declare class Account {"));
    assert!(document.contains("export enum ServiceName {"));
    assert!(!document.contains("NeverUsed"));
    assert!(!document.contains("import {"), "imports must be stripped:\n{document}");
    assert!(document.ends_with("}\n") && !document.ends_with("\n\n"));
}

#[test]
fn test_bundle_is_idempotent_on_unchanged_project() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold(tmp.path());
    let husk_toml = open_manifest(tmp.path());

    bundle::run(husk_toml.manifest(), husk_toml.dir(), &BundleParams::default()).unwrap();
    let first = fs::read(tmp.path().join("declaration/api.d.ts")).unwrap();
    bundle::run(husk_toml.manifest(), husk_toml.dir(), &BundleParams::default()).unwrap();
    let second = fs::read(tmp.path().join("declaration/api.d.ts")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_dry_run_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold(tmp.path());
    let husk_toml = open_manifest(tmp.path());

    let report = bundle::run(
        husk_toml.manifest(),
        husk_toml.dir(),
        &BundleParams {
            dry_run: true,
            ..Default::default()
        },
    )
    .unwrap();

    assert!(report.document.is_some());
    assert!(!tmp.path().join("declaration/api.d.ts").exists());
}

#[test]
fn test_exclude_handler_filter() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold(tmp.path());
    let husk_toml = open_manifest(tmp.path());

    let report = bundle::run(
        husk_toml.manifest(),
        husk_toml.dir(),
        &BundleParams {
            exclude_handlers: vec!["AccountHandler".to_string()],
            dry_run: true,
            ..Default::default()
        },
    )
    .unwrap();

    let document = report.document.unwrap();
    assert!(!document.contains("AccountHandler"), "got:\n{document}");
    assert!(!document.contains("LoginReq"), "got:\n{document}");
    // The entity and the extra enum still come through.
    assert!(document.contains("Account"));
    assert!(document.contains("ServiceName"));
}

#[test]
fn test_include_filter_makes_predicate_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold(tmp.path());
    // A handler file whose class does not reach the framework base.
    write(
        &tmp.path().join("src/handler/Stray.ts"),
        "export class Stray {\n  run(x: string): void;\n}\n",
    );
    let husk_toml = open_manifest(tmp.path());

    // Scanned: silently skipped.
    bundle::run(husk_toml.manifest(), husk_toml.dir(), &BundleParams::default())
        .expect("scanned stray class is skipped");

    // Requested by name: fatal, and nothing is written.
    let out_path = tmp.path().join("declaration/api.d.ts");
    fs::remove_file(&out_path).unwrap();
    let err = bundle::run(
        husk_toml.manifest(),
        husk_toml.dir(),
        &BundleParams {
            include_handlers: vec!["Stray".to_string()],
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("Stray"), "got: {err}");
    assert!(!out_path.exists(), "no partial output on fatal errors");
}

#[test]
fn test_missing_extra_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    scaffold(tmp.path());
    write(
        &tmp.path().join("husk.toml"),
        &MANIFEST.replace("names = [\"ServiceName\"]", "names = [\"WorkerName\"]"),
    );
    let husk_toml = open_manifest(tmp.path());

    let err = bundle::run(husk_toml.manifest(), husk_toml.dir(), &BundleParams::default())
        .unwrap_err();
    assert!(err.to_string().contains("WorkerName"), "got: {err}");
}
