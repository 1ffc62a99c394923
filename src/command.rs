//! Line commands of the terminal front-end

use crate::api::AdminAction;
use crate::state::UserField;

pub const HELP: &str = "\
Commands:
  input <url>          edit the long-link input (shows validity)
  shorten [url]        shorten the input, or <url> if given
  links                reload the user's links
  users                reload the user list
  refresh              reload whatever this page shows
  new-user             open an empty user form
  edit-user <id>       open the form on a listed user
  set <field> <value>  set a form field (username, password, first_name,
                       last_name, email, phone, status)
  save                 save the open form
  cancel               close the open form
  toggle <id>          enable/disable a user
  delete <id>          delete a user
  dbinit               re-initialise the database
  demodb               add demo data
  state                print the view state as JSON
  help                 show this help
  quit                 leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Input(String),
    Shorten(Option<String>),
    Links,
    Users,
    Refresh,
    NewUser,
    EditUser(i64),
    Set(UserField, String),
    Save,
    Cancel,
    Toggle(i64),
    Delete(i64),
    Admin(AdminAction),
    State,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "input" => Command::Input(rest.to_string()),
            "shorten" => Command::Shorten(Some(rest.to_string()).filter(|url| !url.is_empty())),
            "links" => Command::Links,
            "users" => Command::Users,
            "refresh" => Command::Refresh,
            "new-user" => Command::NewUser,
            "edit-user" => Command::EditUser(id(rest)?),
            "set" => {
                let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if field.is_empty() {
                    return Err("usage: set <field> <value>".to_string());
                }
                Command::Set(field.parse()?, value.trim().to_string())
            }
            "save" => Command::Save,
            "cancel" => Command::Cancel,
            "toggle" => Command::Toggle(id(rest)?),
            "delete" => Command::Delete(id(rest)?),
            "dbinit" => Command::Admin(AdminAction::InitDatabase),
            "demodb" => Command::Admin(AdminAction::SeedDemoData),
            "state" => Command::State,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };

        Ok(Some(command))
    }
}

fn id(arg: &str) -> Result<i64, String> {
    arg.parse()
        .map_err(|_| format!("expected a numeric user id, got '{}'", arg))
}
