//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `studynote_core` linkage and print health information.
//! - With `<username> <password>`, boot the configured host, sign in
//!   (registering on first use) and print a short overview.

use chrono::{Duration, Local};
use clap::Parser;
use std::process::ExitCode;
use studynote_core::{
    init_logging, ClientError, ServiceClient, ServiceConfig, ServiceHost, UserContext,
};

const CALENDAR_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Parser)]
#[command(name = "studynote_cli")]
#[command(about = "StudyNote core health check", long_about = None)]
#[command(version)]
struct Args {
    /// Account to sign in with; registered on first use
    #[arg(value_name = "USERNAME", requires = "password")]
    username: Option<String>,

    #[arg(value_name = "PASSWORD", requires = "username")]
    password: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    println!("studynote_core ping={}", studynote_core::ping());
    println!("studynote_core version={}", studynote_core::core_version());

    let (Some(username), Some(password)) = (args.username, args.password) else {
        return ExitCode::SUCCESS;
    };

    match run(&username, &password).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(username: &str, password: &str) -> Result<(), String> {
    let config = ServiceConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir).map_err(|err| err.to_string())?;
    }
    println!("storage={:?}", config.storage);

    let host = ServiceHost::spawn_from_config(&config).map_err(|err| err.to_string())?;
    let client = ServiceClient::new(host.handle()).with_timeout(config.request_timeout);

    let user = sign_in(&client, username, password)
        .await
        .map_err(|err| err.to_string())?;
    println!("user id={} username={}", user.id, user.username);

    let overview = overview(&client, &user).await.map_err(|err| err.to_string());
    host.shutdown().map_err(|err| err.to_string())?;
    overview
}

async fn sign_in(
    client: &ServiceClient,
    username: &str,
    password: &str,
) -> Result<UserContext, ClientError> {
    match client.login(username, password).await {
        Err(ClientError::InvalidCredentials) => {
            log::info!("event=cli_register module=cli status=start");
            client.register(username, password).await
        }
        other => other,
    }
}

async fn overview(client: &ServiceClient, user: &UserContext) -> Result<(), ClientError> {
    let subjects = client.get_subjects(user.id).await?;
    let tags = client.get_tags(user.id).await?;
    let notes = client.get_notes(user.id, None).await?;
    let assignments = client.get_assignments(user.id, None).await?;
    let exams = client.get_exams(user.id, None).await?;
    println!(
        "subjects={} tags={} notes={} assignments={} exams={}",
        subjects.len(),
        tags.len(),
        notes.len(),
        assignments.len(),
        exams.len()
    );

    let today = Local::now().date_naive();
    let until = today + Duration::days(CALENDAR_WINDOW_DAYS);
    for event in client.get_calendar_events(user.id, today, until).await? {
        println!("{} {:?} #{} {}", event.date, event.kind, event.id, event.title);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::{CommandFactory, Parser};

    #[test]
    fn args_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn no_arguments_only_reports_health() {
        let args = Args::try_parse_from(["studynote_cli"]).unwrap();
        assert!(args.username.is_none());
        assert!(args.password.is_none());
    }

    #[test]
    fn credentials_are_positional() {
        let args = Args::try_parse_from(["studynote_cli", "ada", "pw"]).unwrap();
        assert_eq!(args.username.as_deref(), Some("ada"));
        assert_eq!(args.password.as_deref(), Some("pw"));
    }

    #[test]
    fn username_without_password_is_rejected() {
        assert!(Args::try_parse_from(["studynote_cli", "ada"]).is_err());
    }
}
