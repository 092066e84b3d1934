use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use onboard_client::{FormController, RegistrationClient, SubmitOutcome};
use onboard_core::{Department, Field};
use onboard_util::{load_env_file, ClientConfig, Environment};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const HELP: &str = "\
commands:
  set <field> <value>   e.g. `set employeeID E-1001`
  clear <field>         empty a single field
  show                  print the form
  submit                validate and send the record
  reset                 clear the form
  quit";

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    load_env_file();
    let config = ClientConfig::from_env()?;
    init_tracing(config.environment)?;

    let transport = RegistrationClient::from_config(&config)?;
    let mut form = FormController::new(transport);

    println!("New employee form ({})", config.server_url);
    println!("{HELP}");
    render(&form);

    let mut lines = BufReader::new(stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(Command::Set(field, value)) => form.update_field(field, value),
            Ok(Command::Show) => render(&form),
            Ok(Command::Submit) => {
                let outcome = form.submit().await;
                if outcome == SubmitOutcome::Invalid {
                    println!("Please fix the highlighted fields.");
                }
                if let Some(notice) = form.notice().filter(|_| outcome != SubmitOutcome::Invalid) {
                    println!("** {} **", notice.message());
                }
                render(&form);
            }
            Ok(Command::Reset) => {
                form.reset();
                render(&form);
            }
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Quit) => break,
            Ok(Command::Empty) => {}
            Err(message) => println!("{message}"),
        }
    }

    Ok(())
}

/// Logs go to stderr so they never interleave with the form on stdout.
fn init_tracing(environment: Environment) -> Result<(), BoxError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match environment {
        Environment::Production => builder.json().try_init(),
        Environment::Development | Environment::Test => builder.compact().try_init(),
    }
}

fn render(form: &FormController) {
    println!();
    for field in Field::ALL {
        let value = form.draft().get(field);
        println!("{:<16} [{}] {}", field.label(), field.wire_name(), value);
        if let Some(error) = form.error_for(field) {
            println!("{:<16} ! {}", "", error.message);
        }
    }
    let departments: Vec<&str> = Department::ALL.iter().map(|d| d.as_str()).collect();
    println!("(departments: {})", departments.join(", "));
    println!();
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Set(Field, String),
    Show,
    Submit,
    Reset,
    Help,
    Quit,
    Empty,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim_start();
    let (verb, rest) = line.split_once(' ').unwrap_or((line.trim_end(), ""));
    match verb {
        "" => Ok(Command::Empty),
        "set" | "clear" => {
            let (name, value) = rest.split_once(' ').unwrap_or((rest.trim_end(), ""));
            let field = Field::from_wire_name(name)
                .ok_or_else(|| format!("unknown field `{name}`; type `show` to list fields"))?;
            let value = if verb == "clear" { "" } else { value };
            Ok(Command::Set(field, value.to_string()))
        }
        "show" => Ok(Command::Show),
        "submit" => Ok(Command::Submit),
        "reset" => Ok(Command::Reset),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command `{other}`; type `help`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keeps_value_verbatim() {
        assert_eq!(
            parse_command("set role Senior Engineer"),
            Ok(Command::Set(Field::Role, "Senior Engineer".to_string()))
        );
        assert_eq!(
            parse_command("set phoneNumber 1234567890 "),
            Ok(Command::Set(Field::PhoneNumber, "1234567890 ".to_string()))
        );
    }

    #[test]
    fn clear_empties_field() {
        assert_eq!(
            parse_command("clear email"),
            Ok(Command::Set(Field::Email, String::new()))
        );
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(parse_command("set salary 10").is_err());
        assert!(parse_command("launch").is_err());
        assert_eq!(parse_command("   "), Ok(Command::Empty));
        assert_eq!(parse_command("submit"), Ok(Command::Submit));
    }
}
