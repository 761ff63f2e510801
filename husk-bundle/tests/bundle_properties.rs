//! End-to-end properties of the bundling pipeline, driven over in-memory
//! projects with the production name-resolution oracle.

use husk_bundle::{bundle, BundleOptions, EntrySet, EntryUnit, ExtraEntry, TypeAnchor};
use husk_project::{ProjectIndex, ProjectOracle};
use husk_syntax::{parse_unit, Statement, TypeExpr};

const FRAMEWORK: &str = "@sora/framework";
const ORM: &str = "@sora/orm";

/// A small but representative backend: two handler classes with an
/// inheritance chain, one decorated entity, a type graph spanning three
/// units (with deliberately unused exports), and one extra enum.
fn scenario() -> (ProjectIndex, EntrySet) {
    let mut index = ProjectIndex::new("/app/src");
    let mut add = |path: &str, source: &str| {
        index
            .add_source(format!("/app/src/{path}"), source)
            .expect("scenario source must parse")
    };

    let base_handler = add(
        "handler/BaseHandler.ts",
        "import {Route} from '@sora/framework';\nimport {SessionInfo} from '../types/session';\nexport class BaseHandler extends Route {\n  info(session: SessionInfo): Promise<SessionInfo> { return this.wrap(session); }\n  protected guard(session: SessionInfo): boolean { return true; }\n}\n",
    );
    let account_handler = add(
        "handler/AccountHandler.ts",
        "import {BaseHandler} from './BaseHandler';\nimport {LoginReq, LoginRes} from '../types/account';\nexport class AccountHandler extends BaseHandler {\n  login(body: LoginReq, raw: Buffer): Promise<LoginRes> { return this.process(body); }\n  private audit(body: LoginReq): void {}\n  static describe(): string { return 'account'; }\n}\n",
    );
    add(
        "types/account.ts",
        "import {UserState} from './user';\nexport interface LoginReq {\n  username: string;\n  password: string;\n}\nexport interface LoginRes {\n  state: UserState;\n  profile: {nickname: string; avatar: string};\n}\nexport interface UnusedShape {\n  leftover: number;\n}\n",
    );
    add(
        "types/user.ts",
        "export enum UserState {\n  Active = 1,\n  Banned = 2,\n}\nexport type Unrelated = string;\n",
    );
    add(
        "types/session.ts",
        "export interface SessionInfo {\n  token: string;\n  expireAt: Date;\n}\n",
    );
    let account_entity = add(
        "database/Account.ts",
        "import {BaseModel} from '@sora/orm';\n@Entity('account')\nexport class Account extends BaseModel {\n  @Column()\n  id: number;\n  nickname: string;\n  private passwordHash: string;\n  static tableName: string;\n  touch(): void { this.updatedAt = now(); }\n}\n",
    );
    let service_name = add(
        "common/ServiceName.ts",
        "export enum ServiceName {\n  Account = 'account',\n}\nexport enum WorkerName {\n  Cleaner = 'cleaner',\n}\n",
    );

    let entries = EntrySet {
        handlers: vec![
            EntryUnit {
                unit: base_handler,
                requested: false,
            },
            EntryUnit {
                unit: account_handler,
                requested: false,
            },
        ],
        entities: vec![EntryUnit {
            unit: account_entity,
            requested: false,
        }],
        extras: vec![ExtraEntry {
            unit: service_name,
            names: vec!["ServiceName".to_string()],
        }],
    };
    (index, entries)
}

fn options() -> BundleOptions {
    BundleOptions {
        handler_base: TypeAnchor::new(FRAMEWORK, "Route"),
        entity_base: TypeAnchor::new(ORM, "BaseModel"),
    }
}

fn run_scenario() -> String {
    let (mut index, entries) = scenario();
    let oracle = ProjectOracle::build(&index);
    let output = bundle(&mut index, &oracle, &entries, &options()).expect("bundle should succeed");
    String::from_utf8(output.buffer).expect("output is utf-8")
}

#[test]
fn test_idempotence_byte_identical_output() {
    assert_eq!(run_scenario(), run_scenario());
}

#[test]
fn test_headers_are_root_relative() {
    let out = run_scenario();
    assert!(out.contains("// handler/AccountHandler.ts\n"), "got:\n{out}");
    assert!(out.contains("// types/account.ts\n"), "got:\n{out}");
    assert!(out.contains("// database/Account.ts\n"), "got:\n{out}");
}

#[test]
fn test_inheritance_merging_with_first_param_cap() {
    let out = run_scenario();

    // The subclass exposes its own method and the merged ancestor method.
    let account = out
        .split("export declare class AccountHandler {")
        .nth(1)
        .and_then(|rest| rest.split("\n}").next())
        .expect("AccountHandler must be emitted");
    assert!(account.contains("login(body: LoginReq): Promise<LoginRes>;"), "got: {account}");
    assert!(account.contains("info(session: SessionInfo): Promise<SessionInfo>;"), "got: {account}");
    // The second source parameter must not appear.
    assert!(!account.contains("raw:"), "got: {account}");
    // Non-public and static members are gone; heritage is gone.
    assert!(!account.contains("audit"), "got: {account}");
    assert!(!account.contains("describe"), "got: {account}");
    assert!(!out.contains("extends"), "heritage must be stripped:\n{out}");
}

#[test]
fn test_entity_contract_extraction() {
    let out = run_scenario();
    let entity = out
        .split("export declare class Account {")
        .nth(1)
        .and_then(|rest| rest.split("\n}").next())
        .expect("Account must be emitted");
    assert!(entity.contains("id: number;"));
    assert!(entity.contains("nickname: string;"));
    assert!(!entity.contains("passwordHash"));
    assert!(!entity.contains("tableName"));
    assert!(!entity.contains("touch"));
    assert!(!out.contains("@Entity"), "decorators must be stripped:\n{out}");
    assert!(!out.contains("@Column"), "decorators must be stripped:\n{out}");
}

#[test]
fn test_extra_enum_emitted_verbatim_and_unlisted_one_dropped() {
    let out = run_scenario();
    assert!(out.contains("export enum ServiceName {\n  Account = 'account',\n}"), "got:\n{out}");
    assert!(!out.contains("WorkerName"), "unlisted enum must be pruned:\n{out}");
}

#[test]
fn test_minimality_no_orphan_declarations() {
    let out = run_scenario();
    assert!(!out.contains("UnusedShape"), "got:\n{out}");
    assert!(!out.contains("Unrelated"), "got:\n{out}");
}

#[test]
fn test_closure_completeness() {
    let out = run_scenario();
    let unit = parse_unit("/out.d.ts", &out).expect("output must reparse");

    let mut declared = std::collections::HashSet::new();
    for stmt in &unit.statements {
        if let Statement::Decl(decl) = stmt {
            declared.insert(decl.name.clone());
        }
    }
    let ambient = ["Promise", "Date", "Buffer", "Array"];

    let mut missing = Vec::new();
    for stmt in &unit.statements {
        if let Statement::Decl(decl) = stmt {
            decl.for_each_type(&mut |expr| {
                if let TypeExpr::Name(name) | TypeExpr::TypeOf(name) = expr {
                    let head = name.head();
                    if !declared.contains(head) && !ambient.contains(&head) {
                        missing.push(head.to_string());
                    }
                }
            });
        }
    }
    assert!(missing.is_empty(), "unresolved names in output: {missing:?}\n{out}");
}

#[test]
fn test_no_duplicate_declarations() {
    let out = run_scenario();
    let unit = parse_unit("/out.d.ts", &out).expect("output must reparse");

    let mut names = Vec::new();
    for stmt in &unit.statements {
        if let Statement::Decl(decl) = stmt {
            names.push(decl.name.clone());
        }
    }
    let mut deduped = names.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(names.len(), deduped.len(), "duplicates in: {names:?}");
}

#[test]
fn test_cycle_safety_mutual_references_emitted_once() {
    let mut index = ProjectIndex::new("/app/src");
    index
        .add_source(
            "/app/src/handler/GraphHandler.ts",
            "import {Route} from '@sora/framework';\nimport {Node} from '../types/graph';\nexport class GraphHandler extends Route {\n  root(req: Node): Promise<Node> { return this.find(req); }\n}\n",
        )
        .unwrap();
    let handler = index
        .id_of(std::path::Path::new("/app/src/handler/GraphHandler.ts"))
        .unwrap();
    index
        .add_source(
            "/app/src/types/graph.ts",
            "export interface Node {\n  edges: Edge[];\n}\nexport interface Edge {\n  from: Node;\n  to: Node;\n}\n",
        )
        .unwrap();

    let entries = EntrySet {
        handlers: vec![EntryUnit {
            unit: handler,
            requested: false,
        }],
        ..Default::default()
    };
    let oracle = ProjectOracle::build(&index);
    let output = bundle(&mut index, &oracle, &entries, &options()).expect("bundle should succeed");
    let out = String::from_utf8(output.buffer).unwrap();

    assert_eq!(out.matches("interface Node {").count(), 1, "got:\n{out}");
    assert_eq!(out.matches("interface Edge {").count(), 1, "got:\n{out}");
}

#[test]
fn test_fixpoint_reexport_chain_end_to_end() {
    let mut index = ProjectIndex::new("/app/src");
    index
        .add_source(
            "/app/src/handler/ChainHandler.ts",
            "import {Route} from '@sora/framework';\nimport {Payload} from '../link1';\nexport class ChainHandler extends Route {\n  pull(req: Payload): Promise<Payload> { return this.next(req); }\n}\n",
        )
        .unwrap();
    let handler = index
        .id_of(std::path::Path::new("/app/src/handler/ChainHandler.ts"))
        .unwrap();
    index
        .add_source(
            "/app/src/link1.ts",
            "export type Payload = {cursor: string};\nexport {Leftover} from './link2';\n",
        )
        .unwrap();
    index
        .add_source("/app/src/link2.ts", "export {Leftover} from './link3';\n")
        .unwrap();
    index
        .add_source("/app/src/link3.ts", "export {Leftover} from './link4';\n")
        .unwrap();
    index
        .add_source(
            "/app/src/link4.ts",
            "export type Leftover = number;\n",
        )
        .unwrap();

    let entries = EntrySet {
        handlers: vec![EntryUnit {
            unit: handler,
            requested: false,
        }],
        ..Default::default()
    };
    let oracle = ProjectOracle::build(&index);
    let output = bundle(&mut index, &oracle, &entries, &options()).expect("bundle should succeed");
    let out = String::from_utf8(output.buffer).unwrap();

    assert!(out.contains("Payload"), "got:\n{out}");
    assert!(!out.contains("Leftover"), "dead chain must be fully pruned:\n{out}");
    assert!(!out.contains("link2"), "got:\n{out}");
}

#[test]
fn test_output_reparses_as_declaration_subset() {
    let out = run_scenario();
    assert!(parse_unit("/out.d.ts", &out).is_ok(), "got:\n{out}");
}
