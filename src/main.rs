use gap_lib::calendar::CalendarService;
use gap_lib::gmail::MailService;
use gap_lib::{ApiResult, Config};
use std::env;
use std::process;

enum Command {
    Calendars,
    Events(String),
    Labels,
    Profile,
    Drafts,
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Command, &'static str> {
        args.next();

        let command = match args.next() {
            Some(arg) => arg,
            None => return Err("usage: gap <calendars|events [calendar_id]|labels|profile|drafts>"),
        };

        match command.as_str() {
            "calendars" => Ok(Command::Calendars),
            "events" => Ok(Command::Events(
                args.next().unwrap_or_else(|| String::from("primary")),
            )),
            "labels" => Ok(Command::Labels),
            "profile" => Ok(Command::Profile),
            "drafts" => Ok(Command::Drafts),
            _ => Err("unknown command"),
        }
    }
}

async fn run(command: Command, config: Config) -> ApiResult<()> {
    match command {
        Command::Calendars => {
            let calendar = CalendarService::connect(&config).await?;
            println!("{}", calendar.get_calendar_list().await?);
        }
        Command::Events(calendar_id) => {
            let calendar = CalendarService::connect(&config).await?;
            let query = gap_lib::calendar::EventsQuery::new(calendar_id);
            let events = calendar.get_calendar_events_by_date(&query).await?;
            if events.events.is_empty() {
                println!("No upcoming events found.");
            } else {
                println!("{}", events);
            }
        }
        Command::Labels => {
            let mail = MailService::connect(&config).await?;
            for label in mail.get_labels().await? {
                println!("{} | {}", label.name, label.id);
            }
        }
        Command::Profile => {
            let mail = MailService::connect(&config).await?;
            let profile = mail.get_profile().await?;
            println!(
                "{} ({} messages, {} threads)",
                profile.email_address, profile.messages_total, profile.threads_total
            );
        }
        Command::Drafts => {
            let mail = MailService::connect(&config).await?;
            for draft in mail.list_drafts(None).await?.drafts {
                let snippet = draft
                    .message
                    .as_ref()
                    .and_then(|m| m.snippet.as_deref())
                    .unwrap_or("");
                println!("{} | {}", draft.id, snippet);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    gap_lib::init_tracing();

    let command = Command::parse(env::args()).unwrap_or_else(|err| {
        eprintln!("Problem parsing arguments: {err}");
        process::exit(1);
    });

    let config = Config::from_env().unwrap_or_else(|err| {
        eprintln!("Problem reading configuration: {err}");
        process::exit(1);
    });

    if let Err(e) = run(command, config).await {
        eprintln!("Application error: {e}");
        process::exit(1);
    }
}
