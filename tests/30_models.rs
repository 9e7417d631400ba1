use anyhow::Result;
use sqlx::PgPool;
use std::sync::OnceLock;
use tokio::sync::Mutex;

use hireboard_api::error::ApiError;
use hireboard_api::filter::{CompanyFilter, JobFilter};
use hireboard_api::models::company::{Company, CompanyInput, CompanyUpdate};
use hireboard_api::models::job::{Job, JobInput, JobUpdate};
use hireboard_api::models::user::{User, UserInput, UserUpdate};

// Store-backed tests. They need a reachable Postgres via DATABASE_URL and
// skip themselves when it is absent. Tables are rebuilt per test; a process
// wide lock keeps tests from interleaving on the shared tables.

static DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn db_lock() -> &'static Mutex<()> {
    DB_LOCK.get_or_init(|| Mutex::new(()))
}

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    match PgPool::connect(&url).await {
        Ok(pool) => Some(pool),
        Err(e) => {
            eprintln!("skipping store tests: cannot connect to DATABASE_URL: {}", e);
            None
        }
    }
}

async fn rebuild_schema(pool: &PgPool) -> Result<()> {
    sqlx::query("DROP TABLE IF EXISTS applications, jobs, users, companies CASCADE")
        .execute(pool)
        .await?;
    for stmt in [
        "CREATE TABLE companies (
            handle VARCHAR(25) PRIMARY KEY CHECK (handle = lower(handle)),
            name TEXT UNIQUE NOT NULL,
            num_employees INTEGER CHECK (num_employees >= 0),
            description TEXT NOT NULL,
            logo_url TEXT
        )",
        "CREATE TABLE users (
            username VARCHAR(25) PRIMARY KEY,
            password TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE CHECK (position('@' IN email) > 1),
            is_admin BOOLEAN NOT NULL DEFAULT FALSE
        )",
        "CREATE TABLE jobs (
            id SERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            salary INTEGER CHECK (salary >= 0),
            equity NUMERIC CHECK (equity >= 0 AND equity <= 1.0),
            company_handle VARCHAR(25) NOT NULL REFERENCES companies ON DELETE CASCADE
        )",
        "CREATE TABLE applications (
            username VARCHAR(25) REFERENCES users ON DELETE CASCADE,
            job_id INTEGER REFERENCES jobs ON DELETE CASCADE,
            PRIMARY KEY (username, job_id)
        )",
    ] {
        sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}

fn company_input(n: u32) -> CompanyInput {
    CompanyInput {
        handle: format!("c{}", n),
        name: format!("C{}", n),
        num_employees: Some(n as i32),
        description: format!("Desc{}", n),
        logo_url: Some(format!("http://c{}.img", n)),
    }
}

fn user_input(name: &str, is_admin: bool) -> UserInput {
    UserInput {
        username: name.to_string(),
        password: "password1".to_string(),
        first_name: format!("{}F", name.to_uppercase()),
        last_name: format!("{}L", name.to_uppercase()),
        email: format!("{}@user.com", name),
        is_admin,
    }
}

fn job_input(title: &str, salary: i32, equity: &str, handle: &str) -> JobInput {
    JobInput {
        title: title.to_string(),
        salary: Some(salary),
        equity: Some(equity.to_string()),
        company_handle: handle.to_string(),
    }
}

/// Seed the common fixture set: c1..c3, u1/admin, Job1..Job3.
async fn seed(pool: &PgPool) -> Result<Vec<Job>> {
    for n in 1..=3 {
        Company::create(pool, &company_input(n)).await?;
    }
    User::register(pool, &user_input("u1", false)).await?;
    User::register(pool, &user_input("admin", true)).await?;

    let mut jobs = vec![];
    jobs.push(Job::create(pool, &job_input("Job1", 100_000, "0.1", "c1")).await?);
    jobs.push(Job::create(pool, &job_input("Job2", 200_000, "0.2", "c1")).await?);
    jobs.push(Job::create(pool, &job_input("Job3", 300_000, "0", "c2")).await?);
    Ok(jobs)
}

fn assert_bad_request(err: ApiError) {
    assert_eq!(err.status_code(), 400, "expected 400, got: {:?}", err);
}

fn assert_not_found(err: ApiError) {
    assert_eq!(err.status_code(), 404, "expected 404, got: {:?}", err);
}

#[tokio::test]
async fn job_crud_round_trip() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let _guard = db_lock().lock().await;
    rebuild_schema(&pool).await?;
    let jobs = seed(&pool).await?;

    // Create-then-read preserves every field, equity as the exact string
    let created = &jobs[0];
    let fetched = Job::get(&pool, created.id).await?;
    assert_eq!(&fetched, created);
    assert_eq!(fetched.equity.as_deref(), Some("0.1"));
    assert_eq!(fetched.salary, Some(100_000));
    assert_eq!(fetched.company_handle, "c1");

    // Creating against a missing company fails before the insert
    let err = Job::create(&pool, &job_input("nope", 1, "0", "ghost"))
        .await
        .unwrap_err();
    assert_not_found(err);

    // Partial update touches only the named fields
    let update = JobUpdate {
        title: Some("Job1-new".to_string()),
        salary: None,
        equity: None,
    };
    let updated = Job::update(&pool, created.id, &update).await?;
    assert_eq!(updated.title, "Job1-new");
    assert_eq!(updated.salary, Some(100_000));
    assert_eq!(updated.equity.as_deref(), Some("0.1"));

    // Update and delete of a missing id are NotFound, never false success
    let err = Job::update(&pool, 9999, &update).await.unwrap_err();
    assert_not_found(err);
    let err = Job::remove(&pool, 9999).await.unwrap_err();
    assert_not_found(err);
    let err = Job::get(&pool, 9999).await.unwrap_err();
    assert_not_found(err);

    Job::remove(&pool, created.id).await?;
    let err = Job::get(&pool, created.id).await.unwrap_err();
    assert_not_found(err);

    Ok(())
}

#[tokio::test]
async fn job_filters_apply_conjunctive_semantics() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let _guard = db_lock().lock().await;
    rebuild_schema(&pool).await?;
    seed(&pool).await?;

    // Empty filter lists everything, ordered by id
    let all = Job::find_all(&pool, &JobFilter::default()).await?;
    let titles: Vec<&str> = all.iter().map(|j| j.title.as_str()).collect();
    assert_eq!(titles, vec!["Job1", "Job2", "Job3"]);

    // minSalary + hasEquity is a conjunction: Job3 has salary but 0 equity
    let filter = JobFilter {
        min_salary: Some(150_000),
        has_equity: Some(true),
        ..Default::default()
    };
    let matched = Job::find_all(&pool, &filter).await?;
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].title, "Job2");

    // Case-insensitive substring title match
    let filter = JobFilter {
        title: Some("job".to_string()),
        ..Default::default()
    };
    assert_eq!(Job::find_all(&pool, &filter).await?.len(), 3);

    // Salary band with both bounds
    let filter = JobFilter {
        min_salary: Some(150_000),
        max_salary: Some(250_000),
        ..Default::default()
    };
    let matched = Job::find_all(&pool, &filter).await?;
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].title, "Job2");

    // No matches is an empty list, not an error
    let filter = JobFilter {
        title: Some("nope".to_string()),
        ..Default::default()
    };
    assert!(Job::find_all(&pool, &filter).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn company_crud_and_cascade() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let _guard = db_lock().lock().await;
    rebuild_schema(&pool).await?;
    let jobs = seed(&pool).await?;

    // Duplicate handle is a BadRequest, not a store error
    let err = Company::create(&pool, &company_input(1)).await.unwrap_err();
    assert_bad_request(err);

    // Read-one embeds the company's jobs
    let detail = Company::get(&pool, "c1").await?;
    assert_eq!(detail.company.name, "C1");
    assert_eq!(detail.jobs.len(), 2);

    // Employee-range filter
    let filter = CompanyFilter {
        min_employees: Some(2),
        max_employees: Some(3),
        ..Default::default()
    };
    let matched = Company::find_all(&pool, &filter).await?;
    let handles: Vec<&str> = matched.iter().map(|c| c.handle.as_str()).collect();
    assert_eq!(handles, vec!["c2", "c3"]);

    // Partial update leaves unmentioned fields alone
    let update = CompanyUpdate {
        name: Some("C1-new".to_string()),
        num_employees: None,
        description: None,
        logo_url: None,
    };
    let updated = Company::update(&pool, "c1", &update).await?;
    assert_eq!(updated.name, "C1-new");
    assert_eq!(updated.num_employees, Some(1));

    // Deleting the company cascades to its jobs
    Company::remove(&pool, "c1").await?;
    let err = Company::get(&pool, "c1").await.unwrap_err();
    assert_not_found(err);
    let err = Job::get(&pool, jobs[0].id).await.unwrap_err();
    assert_not_found(err);

    let err = Company::remove(&pool, "ghost").await.unwrap_err();
    assert_not_found(err);

    Ok(())
}

#[tokio::test]
async fn user_lifecycle_and_applications() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let _guard = db_lock().lock().await;
    rebuild_schema(&pool).await?;
    let jobs = seed(&pool).await?;

    // Registration stores a hash, not the password
    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE username = 'u1'")
        .fetch_one(&pool)
        .await?;
    assert_ne!(stored, "password1");

    // Credential check
    let user = User::authenticate(&pool, "u1", "password1").await?;
    assert_eq!(user.username, "u1");
    assert!(!user.is_admin);
    let err = User::authenticate(&pool, "u1", "wrong").await.unwrap_err();
    assert_eq!(err.status_code(), 401);
    let err = User::authenticate(&pool, "ghost", "password1").await.unwrap_err();
    assert_eq!(err.status_code(), 401);

    // Duplicate username rejected
    let err = User::register(&pool, &user_input("u1", false)).await.unwrap_err();
    assert_bad_request(err);

    // Listing is ordered by username
    let users = User::find_all(&pool).await?;
    let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["admin", "u1"]);

    // Applications: both entities must exist, duplicates are rejected
    User::apply(&pool, "u1", jobs[0].id).await?;
    User::apply(&pool, "u1", jobs[1].id).await?;
    let err = User::apply(&pool, "u1", jobs[0].id).await.unwrap_err();
    assert_bad_request(err);
    let err = User::apply(&pool, "ghost", jobs[0].id).await.unwrap_err();
    assert_not_found(err);
    let err = User::apply(&pool, "u1", 9999).await.unwrap_err();
    assert_not_found(err);

    // Read-one derives applied job ids from the join table
    let detail = User::get(&pool, "u1").await?;
    assert_eq!(detail.jobs, vec![jobs[0].id, jobs[1].id]);

    // Partial update re-hashes a new password and renames columns
    let update = UserUpdate {
        first_name: Some("U1F-new".to_string()),
        last_name: None,
        email: None,
        password: Some("password2".to_string()),
    };
    let updated = User::update(&pool, "u1", &update).await?;
    assert_eq!(updated.first_name, "U1F-new");
    assert!(User::authenticate(&pool, "u1", "password2").await.is_ok());
    assert!(User::authenticate(&pool, "u1", "password1").await.is_err());

    // Removal cascades applications
    User::remove(&pool, "u1").await?;
    let err = User::get(&pool, "u1").await.unwrap_err();
    assert_not_found(err);
    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE username = 'u1'")
            .fetch_one(&pool)
            .await?;
    assert_eq!(remaining, 0);

    Ok(())
}
