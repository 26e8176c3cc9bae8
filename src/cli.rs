use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};

use crate::claims::{UuidV4, Validity};
use crate::client_secret::{generate_client_secret, ClientSecretRequest};
use crate::config::Config;

const ANSI_RESET: &str = "\u{1b}[0m";
const ANSI_RED: &str = "\u{1b}[31m";
const ANSI_GREEN: &str = "\u{1b}[32m";
const ANSI_YELLOW: &str = "\u{1b}[33m";
const ANSI_BLUE: &str = "\u{1b}[34m";
const ANSI_PURPLE: &str = "\u{1b}[35m";
const ANSI_CYAN: &str = "\u{1b}[36m";

const CLEAR_SCREEN: &str = "\u{1b}[H\u{1b}[2J";
const MENU_WIDTH: usize = 50;
const PATH_DISPLAY_WIDTH: usize = 20;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Interactive menu that collects the four identifiers and prints a client
/// secret on demand.
pub struct Menu<R, W> {
    input: R,
    output: W,
    key_id: Option<String>,
    team_id: Option<String>,
    client_id: Option<String>,
    key_file: Option<PathBuf>,
    validity: Validity,
    message: Option<String>,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(config: Config, input: R, output: W) -> Self {
        Self {
            input,
            output,
            key_id: config.key_id,
            team_id: config.team_id,
            client_id: config.client_id,
            key_file: config.key_file,
            validity: config.validity,
            message: None,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Loop until the user picks `0` or input runs out.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            write!(self.output, "{CLEAR_SCREEN}")?;
            self.print_menu()?;
            if let Some(message) = self.message.take() {
                writeln!(self.output, "{message}\n")?;
            }

            let Some(choice) = self.prompt("Choose an option: ")? else {
                break;
            };

            match choice.to_lowercase().as_str() {
                "1" => match self.prompt(&format!("{ANSI_CYAN}Enter the Key ID: {ANSI_RESET}"))? {
                    Some(value) => self.key_id = non_empty(value),
                    None => break,
                },
                "2" => match self.prompt(&format!("{ANSI_GREEN}Enter the Team ID: {ANSI_RESET}"))? {
                    Some(value) => self.team_id = non_empty(value),
                    None => break,
                },
                "3" => match self.prompt(&format!(
                    "{ANSI_YELLOW}Enter the Client ID: {ANSI_RESET}"
                ))? {
                    Some(value) => self.client_id = non_empty(value),
                    None => break,
                },
                "4" => match self.prompt(&format!(
                    "{ANSI_BLUE}Enter the Key File Path: {ANSI_RESET}"
                ))? {
                    Some(value) => self.set_key_file(value),
                    None => break,
                },
                "5" => self.generate(),
                "0" => break,
                _ => {
                    self.message = Some(format!(
                        "{ANSI_RED}\nInvalid input. Please try again.{ANSI_RESET}"
                    ))
                }
            }
        }

        write!(self.output, "{CLEAR_SCREEN}")?;
        writeln!(
            self.output,
            "{ANSI_YELLOW}\nProgram is terminating. Goodbye!{ANSI_RESET}"
        )?;
        self.output.flush()
    }

    /// Returns the trimmed line, or `None` at end of input.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn print_menu(&mut self) -> io::Result<()> {
        let key_file = self
            .key_file
            .as_deref()
            .map(|path| shorten_path(&path.to_string_lossy(), PATH_DISPLAY_WIDTH));

        let lines = [
            (
                ANSI_CYAN,
                format!(" 1. Set Key ID {}", format_value(self.key_id.as_deref())),
            ),
            (
                ANSI_GREEN,
                format!(" 2. Set Team ID {}", format_value(self.team_id.as_deref())),
            ),
            (
                ANSI_YELLOW,
                format!(
                    " 3. Set Client ID {}",
                    format_value(self.client_id.as_deref())
                ),
            ),
            (
                ANSI_BLUE,
                format!(" 4. Set Key File Path {}", format_value(key_file.as_deref())),
            ),
            (ANSI_PURPLE, " 5. Generate JWT".to_string()),
        ];

        let bar = "═".repeat(MENU_WIDTH);
        writeln!(self.output, "\n╔{bar}╗")?;
        writeln!(self.output, "║{:^MENU_WIDTH$}║", "A P P L E   J W T   G E N E R A T O R")?;
        writeln!(self.output, "╠{bar}╣")?;
        writeln!(self.output, "║{:MENU_WIDTH$}║", "")?;
        for (color, text) in lines {
            writeln!(self.output, "║{color}{text:MENU_WIDTH$}{ANSI_RESET}║")?;
        }
        writeln!(self.output, "║{:MENU_WIDTH$}║", "")?;
        writeln!(self.output, "║{ANSI_RED}{:MENU_WIDTH$}{ANSI_RESET}║", " 0. Exit")?;
        writeln!(self.output, "║{:>MENU_WIDTH$}║", "by pock.biz ")?;
        writeln!(self.output, "╚{bar}╝")
    }

    fn set_key_file(&mut self, input: String) {
        let path = Path::new(&input);
        if !path.is_file() {
            self.message = Some(format!(
                "{ANSI_RED}Error: The specified file does not exist or is not a file.{ANSI_RESET}"
            ));
            return;
        }

        if input.chars().count() > PATH_DISPLAY_WIDTH {
            self.message = Some(format!("{ANSI_BLUE}Full path: {input}{ANSI_RESET}"));
        }
        self.key_file = Some(PathBuf::from(input));
    }

    fn generate(&mut self) {
        let (Some(key_id), Some(team_id), Some(client_id), Some(key_file)) = (
            self.key_id.clone(),
            self.team_id.clone(),
            self.client_id.clone(),
            self.key_file.clone(),
        ) else {
            self.message = Some(format!(
                "{ANSI_RED}Error: All fields must be filled before generating a JWT.{ANSI_RESET}"
            ));
            return;
        };

        let key_pem = match fs::read(&key_file) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, path = %key_file.display(), "Failed to read key file");
                self.message = Some(format!(
                    "{ANSI_RED}Error generating JWT: {}: {e}{ANSI_RESET}",
                    key_file.display()
                ));
                return;
            }
        };

        let request = ClientSecretRequest {
            key_id,
            team_id,
            client_id,
            key_pem,
            validity: self.validity,
        };

        self.message = Some(match generate_client_secret(&request, Utc::now(), &UuidV4) {
            Ok(secret) => format!(
                "{ANSI_GREEN}Generated JWT: \n{ANSI_RESET}{}\n\n\
                 {ANSI_GREEN}Generation time: {ANSI_RESET}{}\n\
                 {ANSI_GREEN}Expiration time: {ANSI_RESET}{}",
                secret.token,
                format_time(secret.issued_at),
                format_time(secret.expires_at),
            ),
            Err(e) => format!("{ANSI_RED}Error generating JWT: {e}{ANSI_RESET}"),
        });
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn format_value(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("[{value}]"),
        None => "[empty]".to_string(),
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

/// Shorten `path` to `max_len` characters by replacing its middle with `...`.
fn shorten_path(path: &str, max_len: usize) -> String {
    let chars: Vec<char> = path.chars().collect();
    if chars.len() <= max_len {
        return path.to_string();
    }

    let head = (max_len / 2).saturating_sub(2);
    let tail = (max_len / 2).saturating_sub(1);
    let mut shortened: String = chars[..head].iter().collect();
    shortened.push_str("...");
    shortened.extend(&chars[chars.len() - tail..]);
    shortened
}
