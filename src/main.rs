use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use filter_dispatcher::query::{MemoryQuery, QuerySource};
use filter_dispatcher::sql_compiler::{Optimization, SqlBackend, SqlCompiler};
use filter_dispatcher::{impl_reflect, impl_reflect_enum, schema, wire};
use filter_dispatcher::{CompileOptions, FilterCompiler, FilterConfig, FilterNode, Strictness};
use log::info;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "filterc", version, about = "Filter AST 校验、编译与求值工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 按 JSON Schema 校验过滤条件文件
    Validate { file: PathBuf },
    /// 解码并打印格式化后的过滤树
    Show { file: PathBuf },
    /// 把过滤条件编译为 SQL (演示模型 Issue)
    Sql {
        file: PathBuf,
        /// 表映射配置文件
        #[arg(long, default_value = "filter_config.json")]
        config: PathBuf,
        #[arg(long, value_enum, default_value_t = BackendArg::Postgres)]
        backend: BackendArg,
    },
    /// 在演示数据上求值, 同时走内存谓词和延迟查询两条路径
    Eval {
        file: PathBuf,
        /// 条件无法编译时报错而不是忽略
        #[arg(long)]
        strict: bool,
    },
    /// 交互模式: 每行输入一个 JSON 过滤条件
    Repl,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Postgres,
    Mysql,
    Sqlite,
}

impl From<BackendArg> for SqlBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Postgres => SqlBackend::Postgres,
            BackendArg::Mysql => SqlBackend::MySql,
            BackendArg::Sqlite => SqlBackend::Sqlite,
        }
    }
}

// ---- 演示模型 ----

#[derive(Debug, Clone, Copy)]
enum IssueStatus {
    Open,
    InProgress,
    Closed,
}

impl_reflect_enum!(IssueStatus { Open, InProgress, Closed });

#[derive(Debug, Clone)]
struct User {
    name: String,
    email: Option<String>,
}

impl_reflect!(User {
    property "Name" => name: String,
    property "Email" => email: Option<String>,
});

#[derive(Debug, Clone)]
struct Comment {
    author: String,
    content: String,
}

impl_reflect!(Comment {
    property "Author" => author: String,
    property "Content" => content: String,
});

#[derive(Debug, Clone)]
struct Issue {
    id: i64,
    title: String,
    status: IssueStatus,
    priority: i32,
    created_date: NaiveDateTime,
    assignee: Option<User>,
    comments: Vec<Comment>,
    labels: Vec<String>,
}

impl_reflect!(Issue {
    property "Id" => id: i64,
    property "Title" => title: String,
    property "Status" => status: IssueStatus,
    property "Priority" => priority: i32,
    property "CreatedDate" => created_date: NaiveDateTime,
    property "Assignee" => assignee: Option<User>,
    property "Comments" => comments: Vec<Comment>,
    property "Labels" => labels: Vec<String>,
});

fn day(month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, day)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap_or_default()
}

fn user(name: &str) -> Option<User> {
    Some(User { name: name.to_string(), email: Some(format!("{}@example.com", name)) })
}

fn comment(author: &str, content: &str) -> Comment {
    Comment { author: author.to_string(), content: content.to_string() }
}

fn demo_issues() -> Vec<Issue> {
    vec![
        Issue {
            id: 1,
            title: "Release Plan v1".to_string(),
            status: IssueStatus::Open,
            priority: 3,
            created_date: day(1, 15),
            assignee: user("alice"),
            comments: vec![comment("bob", "found a bug in the installer")],
            labels: vec!["release".to_string()],
        },
        Issue {
            id: 2,
            title: "Login page crash".to_string(),
            status: IssueStatus::InProgress,
            priority: 5,
            created_date: day(2, 3),
            assignee: user("bob"),
            comments: vec![comment("carol", "Bug reproduced"), comment("bob", "fix pending review")],
            labels: vec!["bug".to_string(), "frontend".to_string()],
        },
        Issue {
            id: 3,
            title: "Update docs".to_string(),
            status: IssueStatus::Closed,
            priority: 1,
            created_date: day(3, 20),
            assignee: None,
            comments: Vec::new(),
            labels: Vec::new(),
        },
        Issue {
            id: 4,
            title: "Slow search".to_string(),
            status: IssueStatus::Open,
            priority: 2,
            created_date: day(4, 1),
            assignee: user("carol"),
            comments: vec![comment("alice", "looks like an index problem")],
            labels: vec!["performance".to_string()],
        },
    ]
}

// ---- 命令实现 ----

/// 读取文件, 先做 schema 校验再解码
fn load_filter(path: &Path) -> Result<FilterNode> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取过滤条件文件 {}", path.display()))?;
    decode_filter(&content)
}

fn decode_filter(content: &str) -> Result<FilterNode> {
    if let Err(error) = schema::validate(content) {
        for issue in &error.issues {
            println!("  ❌ {}", issue);
        }
        bail!("过滤条件未通过校验 ({} 个问题)", error.issues.len());
    }
    Ok(wire::from_json(content)?)
}

/// 创建SQL编译器实例，优先使用JSON配置，失败时使用默认配置
fn create_compiler_with_config(path: &Path) -> SqlCompiler {
    match FilterConfig::from_json_file(path) {
        Ok(config) => {
            println!("✅ 成功从JSON配置文件加载表映射: {}", path.display());
            SqlCompiler::from_config(config)
        }
        Err(e) => {
            println!("⚠️ 无法加载JSON配置文件 ({}), 使用默认配置", e);
            SqlCompiler::new()
        }
    }
}

fn print_optimizations(optimizations: &[Optimization]) {
    if optimizations.is_empty() {
        return;
    }
    println!("\n[应用的优化]:");
    for opt in optimizations {
        match opt {
            Optimization::InListSplit { field, total_values, chunk_count } => {
                println!("  • 将{}字段的{}个值拆分为{}个IN列表", field, total_values, chunk_count);
            }
            Optimization::ConstantFalse { field } => {
                println!("  • {}与null的大小比较恒为false", field);
            }
        }
    }
}

fn run_validate(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取过滤条件文件 {}", path.display()))?;
    match schema::validate(&content) {
        Ok(()) => {
            println!("✅ {} 符合 schema {}", path.display(), schema::SCHEMA_VERSION);
            Ok(())
        }
        Err(error) => {
            for issue in &error.issues {
                println!("  ❌ {}", issue);
            }
            bail!("{} 未通过校验", path.display())
        }
    }
}

fn run_show(path: &Path) -> Result<()> {
    let node = load_filter(path)?;
    println!("[过滤树] 深度 {}:", node.depth());
    println!("{}", wire::to_json_pretty(&node)?);
    Ok(())
}

fn run_sql(path: &Path, config: &Path, backend: SqlBackend) -> Result<()> {
    let node = load_filter(path)?;
    let compiler = create_compiler_with_config(config);
    let filter = FilterCompiler::with_options(compiler.config().compile_options())
        .compile_query::<Issue>(&node)?;
    println!("\n[延迟查询]: {}", filter);

    let result = compiler.compile(&filter, backend);
    println!("\n[生成的 SQL]:");
    println!("{}", result.sql);
    print_optimizations(&result.optimizations);
    Ok(())
}

fn evaluate(node: &FilterNode, options: CompileOptions) -> Result<()> {
    let compiler = FilterCompiler::with_options(options);
    let issues = demo_issues();

    println!("[步骤 1]: 编译为内存谓词...");
    let predicate = compiler.compile::<Issue>(node)?;
    let eager: Vec<i64> = predicate.filter(&issues).map(|issue| issue.id).collect();
    println!("✓ 命中 {:?}", eager);

    println!("[步骤 2]: 编译为延迟查询...");
    let filter = compiler.compile_query::<Issue>(node)?;
    println!("  {}", filter);
    let deferred: Vec<i64> = MemoryQuery::new(&issues).apply(&filter).iter().map(|issue| issue.id).collect();
    println!("✓ 命中 {:?}", deferred);

    if eager != deferred {
        bail!("内存谓词与延迟查询结果不一致");
    }
    for issue in issues.iter().filter(|issue| eager.contains(&issue.id)) {
        println!("  #{} [{:?}] {}", issue.id, issue.status, issue.title);
    }
    Ok(())
}

fn run_eval(path: &Path, strict: bool) -> Result<()> {
    let node = load_filter(path)?;
    let options = CompileOptions { strictness: if strict { Strictness::Strict } else { Strictness::Lenient } };
    evaluate(&node, options)
}

fn run_repl() -> Result<()> {
    println!("--- Filter Dispatcher REPL: 每行输入一个 JSON 过滤条件, Ctrl-D 退出 ---");
    let mut editor = DefaultEditor::new()?;
    let compiler = SqlCompiler::new();
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                let node = match decode_filter(line) {
                    Ok(node) => node,
                    Err(e) => {
                        println!("✗ {}", e);
                        continue;
                    }
                };
                if let Err(e) = evaluate(&node, CompileOptions::default()) {
                    println!("✗ {}", e);
                    continue;
                }
                let filter = filter_dispatcher::compile_query::<Issue>(&node);
                println!("SQL: {}", compiler.compile(&filter, SqlBackend::Postgres).sql);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    info!("filterc started");

    match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Show { file } => run_show(&file),
        Commands::Sql { file, config, backend } => run_sql(&file, &config, backend.into()),
        Commands::Eval { file, strict } => run_eval(&file, strict),
        Commands::Repl => run_repl(),
    }
}
