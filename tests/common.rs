#![allow(dead_code)]

use std::{collections::HashMap, path::PathBuf};

use mcir::{
    ast::{
        Program,
        common::{Ident, Span},
        expressions::{BinaryOp, Expression, ExpressionKind, FnCallOp, Literal, UnaryOp},
        functions::{FunctionDef, Modifier},
        statements::{
            AssignStmt, Block, CommandStmt, ForStmt, IfStmt, ReturnStmt, Statement, VariableDef,
            WhileStmt,
        },
    },
    codegen::Datapack,
    driver::{CompileError, compile_program, config::DatapackConfig},
    ir::codes::CodeGenerators,
    library::register_builtins,
    scope::{FunctionImpl, ScopeIndex, SymbolKind, SymbolTable, types::Type},
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A program under construction, with the symbol table scope resolution
/// would have produced.
pub struct TestProgram {
    pub symbols: SymbolTable,
    pub codes: CodeGenerators,
    pub root: ScopeIndex,
    pub globals: Vec<VariableDef>,
    pub functions: Vec<FunctionDef>,
    pub config: DatapackConfig,
}

impl TestProgram {
    pub fn new() -> Self {
        init_tracing();
        let mut symbols = SymbolTable::new();
        let mut codes = CodeGenerators::default();
        let root = symbols.create_scope("program", None);
        register_builtins(&mut symbols, root, &mut codes);
        Self {
            symbols,
            codes,
            root,
            globals: Vec::new(),
            functions: Vec::new(),
            config: DatapackConfig {
                namespace: "test".into(),
                objective: "t".into(),
                storage: "test:vars".into(),
            },
        }
    }

    /// Declares a function and returns the scope holding its parameters.
    pub fn declare_function(&mut self, name: &str, params: &[(&str, Type)], ret: Type) -> ScopeIndex {
        let (_, scope) = self.symbols.declare_function(
            self.root,
            name,
            params,
            ret,
            FunctionImpl::User,
            Span::default(),
            &mut self.codes,
        );
        scope
    }

    pub fn scope(&mut self, parent: ScopeIndex) -> ScopeIndex {
        self.symbols.create_scope("block", Some(parent))
    }

    pub fn var(&mut self, scope: ScopeIndex, name: &str, ty: Type) {
        self.symbols
            .declare_variable(scope, name, ty, Span::default(), &mut self.codes);
    }

    pub fn global(&mut self, name: &str, ty: Type, value: Option<Expression>) {
        self.var(self.root, name, ty.clone());
        self.globals.push(VariableDef {
            name: ident_at(name),
            ty,
            value,
            span: Span::default(),
        });
    }

    pub fn define(
        &mut self,
        name: &str,
        scope: ScopeIndex,
        modifiers: Vec<Modifier>,
        statements: Vec<Statement>,
    ) {
        self.functions.push(FunctionDef {
            name: ident_at(name),
            modifiers,
            scope,
            body: block(statements),
            span: Span::default(),
        });
    }

    pub fn program(&self) -> Program {
        Program {
            file_path: PathBuf::from("test.mc"),
            scope: self.root,
            globals: self.globals.clone(),
            functions: self.functions.clone(),
        }
    }

    pub fn compile(&mut self) -> Result<Datapack, CompileError> {
        let program = self.program();
        compile_program(&program, &self.symbols, &mut self.codes, &self.config)
    }

    pub fn code_of(&self, scope: ScopeIndex, name: &str) -> String {
        let idx = self.symbols.lookup(scope, name).expect("declared symbol");
        self.symbols[idx].code.clone()
    }

    /// The label of a function.
    pub fn label_of(&self, name: &str) -> String {
        self.code_of(self.root, name)
    }

    /// The code of a function's return slot.
    pub fn return_code_of(&self, name: &str) -> String {
        let idx = self.symbols.lookup(self.root, name).expect("declared function");
        let SymbolKind::Function(function) = &self.symbols[idx].kind else {
            panic!("{name} is not a function");
        };
        self.symbols[function.ret].code.clone()
    }

    /// Compiles, loads the datapack, calls `name` and reads its return slot.
    pub fn run(&mut self, name: &str) -> (i64, Vec<String>) {
        let pack = self.compile().expect("program compiles");
        let mut vm = Vm::new(&pack);
        vm.load();
        vm.call(&self.label_of(name));
        (vm.score(&self.return_code_of(name)), vm.output)
    }
}

fn ident_at(name: &str) -> Ident {
    Ident::new(name, Span::default())
}

fn expression(kind: ExpressionKind, ty: Type) -> Expression {
    Expression {
        kind,
        ty,
        span: Span::default(),
    }
}

pub fn int(value: i32) -> Expression {
    expression(ExpressionKind::Literal(Literal::Int(value)), Type::Int)
}

pub fn boolean(value: bool) -> Expression {
    expression(ExpressionKind::Literal(Literal::Bool(value)), Type::Bool)
}

pub fn float(value: f64) -> Expression {
    expression(ExpressionKind::Literal(Literal::Float(value)), Type::Float)
}

pub fn string(value: &str) -> Expression {
    expression(
        ExpressionKind::Literal(Literal::Str(value.to_string())),
        Type::String,
    )
}

pub fn ident(name: &str, ty: Type) -> Expression {
    expression(ExpressionKind::Identifier(ident_at(name)), ty)
}

pub fn bin(lhs: Expression, op: BinaryOp, rhs: Expression) -> Expression {
    let ty = if op.is_comparison() || op.is_logical() {
        Type::Bool
    } else {
        lhs.ty.clone()
    };
    expression(ExpressionKind::Binary(Box::new(lhs), op, Box::new(rhs)), ty)
}

pub fn not(value: Expression) -> Expression {
    expression(ExpressionKind::Unary(UnaryOp::Not, Box::new(value)), Type::Bool)
}

pub fn neg(value: Expression) -> Expression {
    let ty = value.ty.clone();
    expression(ExpressionKind::Unary(UnaryOp::Neg, Box::new(value)), ty)
}

pub fn call(name: &str, args: Vec<Expression>, ty: Type) -> Expression {
    expression(
        ExpressionKind::Call(FnCallOp {
            target: ident_at(name),
            args,
            span: Span::default(),
        }),
        ty,
    )
}

pub fn block(statements: Vec<Statement>) -> Block {
    Block {
        statements,
        scope: None,
        span: Span::default(),
    }
}

pub fn let_(name: &str, ty: Type, value: Option<Expression>) -> Statement {
    Statement::VariableDef(VariableDef {
        name: ident_at(name),
        ty,
        value,
        span: Span::default(),
    })
}

pub fn assign(name: &str, value: Expression) -> Statement {
    Statement::Assign(AssignStmt {
        target: ident_at(name),
        value,
        span: Span::default(),
    })
}

pub fn expr(value: Expression) -> Statement {
    Statement::Expression(value)
}

pub fn if_(
    condition: Expression,
    then_statements: Vec<Statement>,
    else_statements: Option<Vec<Statement>>,
) -> Statement {
    Statement::If(IfStmt {
        condition,
        then_block: block(then_statements),
        else_block: else_statements.map(block),
        span: Span::default(),
    })
}

pub fn while_(condition: Expression, body: Vec<Statement>) -> Statement {
    Statement::While(WhileStmt {
        condition,
        body: block(body),
        span: Span::default(),
    })
}

pub fn for_(
    scope: ScopeIndex,
    init: Statement,
    condition: Expression,
    step: Statement,
    body: Vec<Statement>,
) -> Statement {
    Statement::For(ForStmt {
        init: Some(Box::new(init)),
        condition: Some(condition),
        step: Some(Box::new(step)),
        body: block(body),
        scope: Some(scope),
        span: Span::default(),
    })
}

pub fn ret(value: Expression) -> Statement {
    Statement::Return(ReturnStmt {
        value: Some(value),
        span: Span::default(),
    })
}

pub fn command(text: &str) -> Statement {
    Statement::Command(CommandStmt {
        command: text.to_string(),
        span: Span::default(),
    })
}

/// Values held in command storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Nbt {
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Nbt>),
    Compound(HashMap<String, Nbt>),
}

impl Nbt {
    fn parse(text: &str) -> Nbt {
        if text == "{}" {
            Nbt::Compound(HashMap::new())
        } else if text.starts_with('"') {
            Nbt::Str(serde_json::from_str(text).expect("quoted string"))
        } else if let Ok(value) = text.parse::<i64>() {
            Nbt::Int(value)
        } else if let Some(value) = text.strip_suffix('f').and_then(|v| v.parse::<f64>().ok()) {
            Nbt::Float(value)
        } else {
            panic!("unsupported nbt value {text:?}")
        }
    }

    /// What `data get` reports for this value.
    fn numeric(&self) -> i64 {
        match self {
            Nbt::Int(value) => *value,
            Nbt::Float(value) => value.floor() as i64,
            Nbt::Str(value) => value.chars().count() as i64,
            Nbt::List(values) => values.len() as i64,
            Nbt::Compound(fields) => fields.len() as i64,
        }
    }

    fn display(&self) -> String {
        match self {
            Nbt::Int(value) => value.to_string(),
            Nbt::Float(value) => format!("{value}f"),
            Nbt::Str(value) => value.clone(),
            Nbt::List(values) => format!("{values:?}"),
            Nbt::Compound(fields) => format!("{fields:?}"),
        }
    }
}

enum Flow {
    /// The command finished, with its result if it produced one.
    Continue(Option<i64>),
    /// The running function returned.
    Return(i64),
}

enum Store<'c> {
    Score(&'c str),
    Storage { path: &'c str, kind: &'c str, scale: f64 },
}

/// Executes the subset of commands the backend emits.
pub struct Vm<'a> {
    namespace: &'a str,
    load: &'a [String],
    functions: HashMap<String, &'a [String]>,
    pub scores: HashMap<String, i64>,
    pub storage: HashMap<String, Nbt>,
    pub output: Vec<String>,
    depth: usize,
}

impl<'a> Vm<'a> {
    pub fn new(pack: &'a Datapack) -> Self {
        let functions = pack
            .functions
            .iter()
            .map(|function| {
                (
                    format!("{}:{}", pack.namespace, function.name),
                    function.commands.as_slice(),
                )
            })
            .collect();
        Self {
            namespace: &pack.namespace,
            load: &pack.load,
            functions,
            scores: HashMap::new(),
            storage: HashMap::new(),
            output: Vec::new(),
            depth: 0,
        }
    }

    pub fn load(&mut self) {
        let load = self.load;
        for function in load {
            self.run(function);
        }
    }

    pub fn call(&mut self, label: &str) -> Option<i64> {
        let id = format!("{}:{}", self.namespace, label);
        self.run(&id)
    }

    pub fn score(&self, holder: &str) -> i64 {
        self.scores.get(holder).copied().unwrap_or(0)
    }

    /// Runs a function, returning the value it returned, if it did.
    pub fn run(&mut self, id: &str) -> Option<i64> {
        let commands = *self
            .functions
            .get(id)
            .unwrap_or_else(|| panic!("unknown function {id}"));
        self.depth += 1;
        assert!(self.depth < 1000, "runaway recursion in {id}");

        let mut result = None;
        for command in commands {
            if let Flow::Return(value) = self.exec(command) {
                result = Some(value);
                break;
            }
        }
        self.depth -= 1;
        result
    }

    fn exec(&mut self, command: &str) -> Flow {
        let command = command.trim();
        if command.is_empty() || command.starts_with('#') {
            return Flow::Continue(None);
        }
        let words: Vec<&str> = command.split(' ').collect();
        match words[0] {
            "function" => Flow::Continue(self.run(words[1])),
            "return" if words[1] == "run" => match self.exec(&words[2..].join(" ")) {
                Flow::Continue(value) => Flow::Return(value.unwrap_or(0)),
                flow => flow,
            },
            "return" => Flow::Return(words[1].parse().expect("return value")),
            "scoreboard" => self.scoreboard(&words),
            "execute" => self.execute(&words[1..]),
            "data" => self.data(&words),
            "tellraw" => {
                let json: Value =
                    serde_json::from_str(&words[2..].join(" ")).expect("tellraw json");
                let line = self.render(&json);
                self.output.push(line);
                Flow::Continue(Some(1))
            }
            _ => panic!("unsupported command {command:?}"),
        }
    }

    fn scoreboard(&mut self, words: &[&str]) -> Flow {
        match (words[1], words[2]) {
            ("objectives", "add") => Flow::Continue(Some(1)),
            ("players", "set") => {
                let value = words[5].parse().expect("score value");
                self.scores.insert(words[3].to_string(), value);
                Flow::Continue(Some(value))
            }
            ("players", "add") | ("players", "remove") => {
                let amount: i64 = words[5].parse().expect("score amount");
                let amount = if words[2] == "add" { amount } else { -amount };
                let value = self.score(words[3]) + amount;
                self.scores.insert(words[3].to_string(), value);
                Flow::Continue(Some(value))
            }
            ("players", "get") => Flow::Continue(Some(self.score(words[3]))),
            ("players", "operation") => {
                let (target, op, source) = (words[3], words[5], words[6]);
                let a = self.score(target);
                let b = self.score(source);
                let value = match op {
                    "=" => b,
                    "+=" => a + b,
                    "-=" => a - b,
                    "*=" => a * b,
                    "/=" if b != 0 => floor_div(a, b),
                    "%=" if b != 0 => a - floor_div(a, b) * b,
                    "/=" | "%=" => a,
                    _ => panic!("unsupported operation {op}"),
                };
                self.scores.insert(target.to_string(), value);
                Flow::Continue(Some(value))
            }
            _ => panic!("unsupported scoreboard command {words:?}"),
        }
    }

    fn execute<'c>(&mut self, words: &[&'c str]) -> Flow {
        let mut stores: Vec<Store<'c>> = Vec::new();
        let mut i = 0;
        loop {
            match words[i] {
                "if" | "unless" => {
                    let expect = words[i] == "if";
                    assert_eq!(words[i + 1], "score");
                    let value = self.score(words[i + 2]);
                    let (holds, consumed) = if words[i + 4] == "matches" {
                        (range_contains(words[i + 5], value), 6)
                    } else {
                        let other = self.score(words[i + 5]);
                        let holds = match words[i + 4] {
                            "=" => value == other,
                            "<" => value < other,
                            "<=" => value <= other,
                            ">" => value > other,
                            ">=" => value >= other,
                            op => panic!("unsupported comparison {op}"),
                        };
                        (holds, 7)
                    };
                    if holds != expect {
                        return Flow::Continue(None);
                    }
                    i += consumed;
                }
                "store" => {
                    assert_eq!(words[i + 1], "result");
                    match words[i + 2] {
                        "score" => {
                            stores.push(Store::Score(words[i + 3]));
                            i += 5;
                        }
                        "storage" => {
                            stores.push(Store::Storage {
                                path: words[i + 4],
                                kind: words[i + 5],
                                scale: words[i + 6].parse().expect("scale"),
                            });
                            i += 7;
                        }
                        other => panic!("unsupported store target {other}"),
                    }
                }
                "run" => {
                    let flow = self.exec(&words[i + 1..].join(" "));
                    if let Flow::Continue(result) = flow {
                        let value = result.unwrap_or(0);
                        for store in stores {
                            match store {
                                Store::Score(holder) => {
                                    self.scores.insert(holder.to_string(), value);
                                }
                                Store::Storage { path, kind, scale } => {
                                    let scaled = value as f64 * scale;
                                    let nbt = if kind == "float" {
                                        Nbt::Float(scaled)
                                    } else {
                                        Nbt::Int(scaled as i64)
                                    };
                                    self.set_path(path, nbt);
                                }
                            }
                        }
                    }
                    return flow;
                }
                other => panic!("unsupported execute subcommand {other}"),
            }
        }
    }

    fn data(&mut self, words: &[&str]) -> Flow {
        assert_eq!(words[2], "storage");
        match words[1] {
            "get" => Flow::Continue(self.get_path(words[4]).map(|value| value.numeric())),
            "remove" => {
                let path = StoragePath::parse(words[4]);
                assert!(path.field.is_none(), "unsupported removal {}", words[4]);
                if path.last {
                    if let Some(Nbt::List(values)) = self.storage.get_mut(path.base) {
                        values.pop();
                    }
                } else {
                    self.storage.remove(path.base);
                }
                Flow::Continue(Some(1))
            }
            "modify" => {
                let path = words[4];
                let value = match words[6] {
                    "value" => Some(Nbt::parse(&words[7..].join(" "))),
                    "from" => self.get_path(words[9]),
                    other => panic!("unsupported data source {other}"),
                };
                let Some(value) = value else {
                    return Flow::Continue(None);
                };
                match words[5] {
                    "set" => self.set_path(path, value),
                    "append" => match self
                        .storage
                        .entry(path.to_string())
                        .or_insert_with(|| Nbt::List(Vec::new()))
                    {
                        Nbt::List(values) => {
                            assert_same_kind(values, &value, path);
                            values.push(value);
                        }
                        other => panic!("append to non list {other:?}"),
                    },
                    other => panic!("unsupported data modification {other}"),
                }
                Flow::Continue(Some(1))
            }
            other => panic!("unsupported data command {other}"),
        }
    }

    fn get_path(&self, text: &str) -> Option<Nbt> {
        let path = StoragePath::parse(text);
        let value = match (path.last, self.storage.get(path.base)?) {
            (true, Nbt::List(values)) => values.last()?,
            (true, _) => return None,
            (false, value) => value,
        };
        match (path.field, value) {
            (None, value) => Some(value.clone()),
            (Some(field), Nbt::Compound(fields)) => fields.get(field).cloned(),
            (Some(_), _) => None,
        }
    }

    fn set_path(&mut self, text: &str, value: Nbt) {
        let path = StoragePath::parse(text);
        if !path.last {
            assert!(path.field.is_none(), "unsupported path {text}");
            self.storage.insert(path.base.to_string(), value);
            return;
        }
        let Some(Nbt::List(values)) = self.storage.get_mut(path.base) else {
            return;
        };
        let Some((slot, rest)) = values.split_last_mut() else {
            return;
        };
        match path.field {
            Some(field) => match slot {
                Nbt::Compound(fields) => {
                    fields.insert(field.to_string(), value);
                }
                other => panic!("field {field} of non compound {other:?}"),
            },
            None => {
                assert_same_kind(rest, &value, text);
                *slot = value;
            }
        }
    }

    pub fn storage_value(&self, path: &str) -> Option<&Nbt> {
        self.storage.get(path)
    }

    fn render(&self, component: &Value) -> String {
        if let Some(text) = component.get("text").and_then(Value::as_str) {
            text.to_string()
        } else if let Some(holder) = component
            .get("score")
            .and_then(|score| score.get("name"))
            .and_then(Value::as_str)
        {
            self.score(holder).to_string()
        } else if let Some(path) = component.get("nbt").and_then(Value::as_str) {
            self.get_path(path).map(|value| value.display()).unwrap_or_default()
        } else {
            panic!("unsupported text component {component}")
        }
    }
}

fn floor_div(a: i64, b: i64) -> i64 {
    let quotient = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        quotient - 1
    } else {
        quotient
    }
}

/// A storage path of the form `base`, `base[-1]` or `base[-1].field`.
struct StoragePath<'p> {
    base: &'p str,
    last: bool,
    field: Option<&'p str>,
}

impl<'p> StoragePath<'p> {
    fn parse(path: &'p str) -> Self {
        match path.split_once("[-1]") {
            None => StoragePath {
                base: path,
                last: false,
                field: None,
            },
            Some((base, rest)) => StoragePath {
                base,
                last: true,
                field: rest.strip_prefix('.'),
            },
        }
    }
}

/// Storage lists hold a single tag type.
fn assert_same_kind(values: &[Nbt], value: &Nbt, path: &str) {
    if let Some(first) = values.first() {
        assert_eq!(
            std::mem::discriminant(first),
            std::mem::discriminant(value),
            "mixed tag types in list {path}: {first:?} and {value:?}"
        );
    }
}

fn range_contains(range: &str, value: i64) -> bool {
    match range.split_once("..") {
        None => range.parse::<i64>().expect("range") == value,
        Some((low, high)) => {
            let low_ok = low.is_empty() || low.parse::<i64>().expect("range") <= value;
            let high_ok = high.is_empty() || value <= high.parse::<i64>().expect("range");
            low_ok && high_ok
        }
    }
}
