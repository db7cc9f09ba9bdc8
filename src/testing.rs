//! 测试用的数据模型

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Pending,
    Closed,
}

crate::impl_reflect_enum!(Status { Active, Pending, Closed });

#[derive(Debug, Clone)]
pub struct Owner {
    pub name: String,
    pub email: Option<String>,
}

crate::impl_reflect!(Owner {
    property "Name" => name: String,
    property "Email" => email: Option<String>,
});

impl Owner {
    pub fn named(name: &str) -> Self {
        Self { name: name.to_string(), email: Some(format!("{}@example.com", name)) }
    }
}

#[derive(Debug, Clone)]
pub struct Tag {
    pub name: String,
    pub weight: i32,
    pub note: Option<String>,
}

crate::impl_reflect!(Tag {
    property "Name" => name: String,
    property "Weight" => weight: i32,
    property "Note" => note: Option<String>,
});

impl Tag {
    pub fn new(name: &str, weight: i32) -> Self {
        Self { name: name.to_string(), weight, note: None }
    }

    pub fn noted(name: &str, weight: i32, note: &str) -> Self {
        Self { note: Some(note.to_string()), ..Self::new(name, weight) }
    }
}

#[derive(Debug, Clone)]
pub struct Ticket {
    pub name: String,
    pub status: Status,
    pub priority: i32,
    pub score: Option<f64>,
    pub budget: Decimal,
    pub id: Uuid,
    pub created_at: NaiveDateTime,
    pub due_at: Option<DateTime<FixedOffset>>,
    pub owner: Owner,
    pub reviewer: Option<Owner>,
    pub tags: Vec<Tag>,
    pub labels: Vec<String>,
    pub code: i32,
    pub secret: String,
}

crate::impl_reflect!(Ticket {
    property "Name" => name: String,
    property "Status" => status: Status,
    property "Priority" => priority: i32,
    property "Score" => score: Option<f64>,
    property "Budget" => budget: Decimal,
    property "Id" => id: Uuid,
    property "CreatedAt" => created_at: NaiveDateTime,
    property "DueAt" => due_at: Option<DateTime<FixedOffset>>,
    property "Owner" => owner: Owner,
    property "Reviewer" => reviewer: Option<Owner>,
    property "Tags" => tags: Vec<Tag>,
    property "Labels" => labels: Vec<String>,
    field "code" => code: i32,
    internal "Secret" => secret: String,
});

fn created(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap()
}

pub fn ticket(name: &str, status: Status) -> Ticket {
    Ticket {
        name: name.to_string(),
        status,
        priority: 1,
        score: None,
        budget: Decimal::new(10000, 2),
        id: Uuid::nil(),
        created_at: created(1),
        due_at: None,
        owner: Owner::named("alice"),
        reviewer: None,
        tags: vec![Tag::new("ops", 1)],
        labels: Vec::new(),
        code: 7,
        secret: "hunter2".to_string(),
    }
}

pub fn sample_tickets() -> Vec<Ticket> {
    let mut devops = ticket("devops-team", Status::Active);
    devops.id = Uuid::from_u128(1);
    devops.score = Some(10.0);
    devops.labels = vec!["infra".to_string()];

    let mut payments = ticket("payments", Status::Active);
    payments.priority = 3;
    payments.score = Some(55.5);
    payments.owner = Owner::named("bob");
    payments.reviewer = Some(Owner::named("bob"));
    payments.budget = Decimal::new(250050, 2);
    payments.id = Uuid::from_u128(2);
    payments.tags = vec![Tag::noted("payments", 3, "x"), Tag::noted("billing", 2, "x")];
    payments.created_at = created(5);
    payments.due_at = DateTime::parse_from_rfc3339("2024-04-01T12:00:00+02:00").ok();

    let mut search = ticket("search", Status::Closed);
    search.id = Uuid::from_u128(3);
    search.budget = Decimal::new(99, 0);
    search.priority = 5;
    search.owner = Owner::named("carol");
    search.reviewer = Some(Owner::named("dave"));
    search.tags = Vec::new();
    search.labels = vec!["search".to_string(), "infra".to_string()];
    search.created_at = created(20);

    vec![devops, payments, search]
}
