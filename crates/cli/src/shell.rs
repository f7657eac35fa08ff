//! Interactive back office shell.
//!
//! A line-oriented loop over any `BufRead`/`Write` pair. After login the
//! dashboard is picked from the user's authorities: admins can add, edit
//! and delete products, clients can only browse. Every command waits for
//! its HTTP call before the next prompt is shown.
//!
//! # Commands
//!
//! ```text
//! signup                 create a client account (prompts for fields)
//! login                  log in (prompts for username and password)
//! logout                 log out
//! list [page] [size]     list products (defaults 0 10)
//! show <id>              show one product
//! add                    add a product (admin)
//! edit <id>              edit a product (admin)
//! delete <id>            delete a product (admin)
//! category <name>        products in a category
//! price <min> <max>      products in a price range
//! whoami                 show the active login
//! help                   list commands
//! quit                   leave the shell
//! ```

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use backoffice_core::{GrantedAuthority, Product, ProductDraft, Role, SignupRequest};

use crate::client::{ApiClient, ClientError};

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Answer to an optional field's prompt in `edit` that removes the value.
const CLEAR_VALUE: &str = "-";

/// Errors raised while running a shell command.
#[derive(Debug, Error)]
pub enum ShellError {
    /// Reading input or writing output failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The API call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Wrong arguments for a known command.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Not a shell command.
    #[error("unknown command '{0}', type 'help' for a list")]
    UnknownCommand(String),

    /// A prompted value could not be parsed.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// Field being entered
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// The command needs a login.
    #[error("please log in first")]
    NotLoggedIn,

    /// The command needs the admin dashboard.
    #[error("this command is only available on the admin dashboard")]
    AdminOnly,

    /// `show`/`edit` for an unknown id.
    #[error("no product with id {0}")]
    ProductNotFound(String),

    /// Input ended in the middle of a prompt.
    #[error("input ended")]
    InputClosed,
}

/// Which set of commands the logged-in user gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    /// Full product management.
    Admin,
    /// Read-only browsing.
    Client,
}

impl Dashboard {
    /// Pick the dashboard for a set of authorities.
    #[must_use]
    pub fn for_authorities(authorities: &[GrantedAuthority]) -> Self {
        if authorities.iter().any(|a| a.authority == Role::ADMIN) {
            Self::Admin
        } else {
            Self::Client
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Client => "client",
        }
    }
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Signup,
    Login,
    Logout,
    List { page: u32, size: u32 },
    Show(String),
    Add,
    Edit(String),
    Delete(String),
    Category(String),
    Price { min: Decimal, max: Decimal },
    WhoAmI,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines parse to `None`.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::UnknownCommand` or `ShellError::Usage`.
    pub fn parse(line: &str) -> Result<Option<Self>, ShellError> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("", _) => return Ok(None),
            ("signup", []) => Self::Signup,
            ("login", []) => Self::Login,
            ("logout", []) => Self::Logout,
            ("list" | "ls", args) if args.len() <= 2 => {
                let mut args = args.iter();
                Self::List {
                    page: args
                        .next()
                        .map_or(Ok(0), |v| parse_arg(v, "list [page] [size]"))?,
                    size: args
                        .next()
                        .map_or(Ok(DEFAULT_PAGE_SIZE), |v| parse_arg(v, "list [page] [size]"))?,
                }
            }
            ("show", [id]) => Self::Show((*id).to_owned()),
            ("add", []) => Self::Add,
            ("edit", [id]) => Self::Edit((*id).to_owned()),
            ("delete" | "rm", [id]) => Self::Delete((*id).to_owned()),
            ("category", [_, ..]) => Self::Category(rest.to_owned()),
            ("price", [min, max]) => Self::Price {
                min: parse_arg(min, "price <min> <max>")?,
                max: parse_arg(max, "price <min> <max>")?,
            },
            ("whoami", []) => Self::WhoAmI,
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            ("list" | "ls", _) => return Err(ShellError::Usage("list [page] [size]")),
            ("show", _) => return Err(ShellError::Usage("show <id>")),
            ("edit", _) => return Err(ShellError::Usage("edit <id>")),
            ("delete" | "rm", _) => return Err(ShellError::Usage("delete <id>")),
            ("category", _) => return Err(ShellError::Usage("category <name>")),
            ("price", _) => return Err(ShellError::Usage("price <min> <max>")),
            (
                "signup" | "login" | "logout" | "add" | "whoami" | "help" | "?" | "quit" | "exit",
                _,
            ) => return Err(ShellError::Usage("command takes no arguments")),
            (other, _) => return Err(ShellError::UnknownCommand(other.to_owned())),
        };

        Ok(Some(command))
    }

    /// Commands that call product endpoints.
    #[must_use]
    pub const fn needs_login(&self) -> bool {
        matches!(
            self,
            Self::List { .. }
                | Self::Show(_)
                | Self::Add
                | Self::Edit(_)
                | Self::Delete(_)
                | Self::Category(_)
                | Self::Price { .. }
        )
    }

    /// Commands that change the catalog.
    #[must_use]
    pub const fn is_admin_only(&self) -> bool {
        matches!(self, Self::Add | Self::Edit(_) | Self::Delete(_))
    }
}

fn parse_arg<T: FromStr>(value: &str, usage: &'static str) -> Result<T, ShellError> {
    value.parse().map_err(|_| ShellError::Usage(usage))
}

/// The interactive shell.
pub struct Shell<R, W> {
    client: ApiClient,
    input: R,
    output: W,
    dashboard: Option<Dashboard>,
    hide_passwords: bool,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    /// Create a shell reading commands from `input` and writing to `output`.
    pub const fn new(client: ApiClient, input: R, output: W) -> Self {
        Self {
            client,
            input,
            output,
            dashboard: None,
            hide_passwords: false,
        }
    }

    /// Read passwords from the terminal without echo instead of from
    /// `input`. Only useful when `input` is an interactive terminal.
    #[must_use]
    pub fn with_hidden_passwords(mut self) -> Self {
        self.hide_passwords = true;
        self
    }

    /// The dashboard of the active login.
    pub const fn dashboard(&self) -> Option<Dashboard> {
        self.dashboard
    }

    /// The underlying API client.
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Consume the shell and return its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until `quit` or end of input.
    ///
    /// Command failures are printed as `error: ...` lines and the loop goes
    /// on. The credentials are cleared on the way out.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::Io` if the terminal cannot be read or written.
    pub async fn run(&mut self) -> Result<(), ShellError> {
        writeln!(
            self.output,
            "Back office shell at {}. Type 'help' for commands.",
            self.client.base_url()
        )?;

        loop {
            self.prompt()?;
            let Some(line) = self.read_line()? else {
                break;
            };

            let result = match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => self.execute(command).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(()) => {}
                Err(ShellError::Io(err)) => return Err(ShellError::Io(err)),
                Err(err) => writeln!(self.output, "error: {err}")?,
            }
        }

        self.client.clear_credentials();
        self.dashboard = None;
        writeln!(self.output, "Goodbye.")?;
        self.output.flush()?;
        Ok(())
    }

    /// Run a single command.
    ///
    /// # Errors
    ///
    /// Returns the `ShellError` describing why the command failed.
    pub async fn execute(&mut self, command: Command) -> Result<(), ShellError> {
        if command.needs_login() && self.dashboard.is_none() {
            return Err(ShellError::NotLoggedIn);
        }
        if command.is_admin_only() && self.dashboard != Some(Dashboard::Admin) {
            return Err(ShellError::AdminOnly);
        }

        match command {
            Command::Signup => self.signup().await,
            Command::Login => self.login().await,
            Command::Logout => self.logout().await,
            Command::List { page, size } => {
                let products = self.client.list_products(page, size).await?;
                self.print_products(&products)
            }
            Command::Show(id) => {
                let found = self.client.get_product(&id).await?;
                let product = found.ok_or(ShellError::ProductNotFound(id))?;
                self.print_product(&product)
            }
            Command::Add => self.add().await,
            Command::Edit(id) => self.edit(id).await,
            Command::Delete(id) => {
                self.client.delete_product(&id).await?;
                writeln!(self.output, "Deleted product {id}.")?;
                Ok(())
            }
            Command::Category(category) => {
                let products = self.client.products_by_category(&category).await?;
                self.print_products(&products)
            }
            Command::Price { min, max } => {
                let products = self.client.products_by_price(min, max).await?;
                self.print_products(&products)
            }
            Command::WhoAmI => self.whoami(),
            Command::Help => self.help(),
            Command::Quit => Ok(()),
        }
    }

    // =========================================================================
    // Account commands
    // =========================================================================

    async fn signup(&mut self) -> Result<(), ShellError> {
        let request = SignupRequest {
            username: self.ask("username")?,
            password: self.ask_secret("password")?.expose_secret().to_owned(),
            email: self.ask("email")?,
            role: "CLIENT".to_owned(),
        };

        let user = self.client.signup(&request).await?;
        writeln!(
            self.output,
            "Account created for {}. Log in to continue.",
            user.username
        )?;
        Ok(())
    }

    async fn login(&mut self) -> Result<(), ShellError> {
        let username = self.ask("username")?;
        let password = self.ask_secret("password")?;

        let authorities = match self.client.login(&username, password).await {
            Ok(authorities) => authorities,
            Err(err) => {
                self.dashboard = None;
                return Err(err.into());
            }
        };

        let dashboard = Dashboard::for_authorities(&authorities);
        self.dashboard = Some(dashboard);
        writeln!(
            self.output,
            "Welcome, {username}! You are on the {} dashboard.",
            dashboard.label()
        )?;
        self.help()
    }

    async fn logout(&mut self) -> Result<(), ShellError> {
        self.client.logout().await;
        self.dashboard = None;
        writeln!(self.output, "Logged out.")?;
        Ok(())
    }

    fn whoami(&mut self) -> Result<(), ShellError> {
        match (self.client.credentials().username(), self.dashboard) {
            (Some(username), Some(dashboard)) => writeln!(
                self.output,
                "{username} ({} dashboard)",
                dashboard.label()
            )?,
            _ => writeln!(self.output, "Not logged in.")?,
        }
        Ok(())
    }

    fn help(&mut self) -> Result<(), ShellError> {
        let mut lines = vec!["signup                 create an account"];
        match self.dashboard {
            None => lines.push("login                  log in"),
            Some(dashboard) => {
                lines.extend([
                    "list [page] [size]     list products",
                    "show <id>              show one product",
                    "category <name>        products in a category",
                    "price <min> <max>      products in a price range",
                ]);
                if dashboard == Dashboard::Admin {
                    lines.extend([
                        "add                    add a product",
                        "edit <id>              edit a product",
                        "delete <id>            delete a product",
                    ]);
                }
                lines.extend([
                    "whoami                 show the active login",
                    "logout                 log out",
                ]);
            }
        }
        lines.extend(["help                   this list", "quit                   leave"]);

        for line in lines {
            writeln!(self.output, "  {line}")?;
        }
        Ok(())
    }

    // =========================================================================
    // Product commands
    // =========================================================================

    async fn add(&mut self) -> Result<(), ShellError> {
        let draft = ProductDraft {
            id: None,
            name: Some(self.ask("name")?),
            price: Some(parse_field(&self.ask("price")?, "price")?),
            description: Some(self.ask("description")?).filter(|d| !d.is_empty()),
            stock: Some(parse_field(&self.ask("stock")?, "stock")?),
            category: Some(self.ask("category")?),
        };

        let product = self.client.create_product(&draft).await?;
        writeln!(self.output, "Saved product {}.", display_id(&product))?;
        Ok(())
    }

    /// Prompt for each field with the current value as default.
    async fn edit(&mut self, id: String) -> Result<(), ShellError> {
        let current = self
            .client
            .get_product(&id)
            .await?
            .ok_or_else(|| ShellError::ProductNotFound(id.clone()))?;
        let mut draft = ProductDraft::from(&current);

        if let Some(name) = self.ask_with_default("name", current.name())? {
            draft.name = Some(name);
        }
        if let Some(price) = self.ask_with_default("price", &current.price().to_string())? {
            draft.price = Some(parse_field(&price, "price")?);
        }
        let description = current.description().unwrap_or("");
        if let Some(description) = self.ask_with_default("description (- to clear)", description)? {
            draft.description = Some(description).filter(|d| d != CLEAR_VALUE);
        }
        if let Some(stock) = self.ask_with_default("stock", &current.stock().to_string())? {
            draft.stock = Some(parse_field(&stock, "stock")?);
        }
        if let Some(category) = self.ask_with_default("category", current.category())? {
            draft.category = Some(category);
        }

        let product = self.client.update_product(&id, &draft).await?;
        writeln!(self.output, "Updated product {}.", display_id(&product))?;
        Ok(())
    }

    fn print_products(&mut self, products: &[Product]) -> Result<(), ShellError> {
        if products.is_empty() {
            writeln!(self.output, "No products.")?;
            return Ok(());
        }

        writeln!(
            self.output,
            "{:<32}  {:<24}  {:>10}  {:>6}  CATEGORY",
            "ID", "NAME", "PRICE", "STOCK"
        )?;
        for product in products {
            writeln!(
                self.output,
                "{:<32}  {:<24}  {:>10}  {:>6}  {}",
                display_id(product),
                product.name(),
                product.price().to_string(),
                product.stock(),
                product.category()
            )?;
        }
        Ok(())
    }

    fn print_product(&mut self, product: &Product) -> Result<(), ShellError> {
        writeln!(self.output, "id:          {}", display_id(product))?;
        writeln!(self.output, "name:        {}", product.name())?;
        writeln!(self.output, "price:       {}", product.price())?;
        writeln!(
            self.output,
            "description: {}",
            product.description().unwrap_or("-")
        )?;
        writeln!(self.output, "stock:       {}", product.stock())?;
        writeln!(self.output, "category:    {}", product.category())?;
        writeln!(self.output, "created:     {}", product.created_at())?;
        writeln!(self.output, "updated:     {}", product.updated_at())?;
        Ok(())
    }

    // =========================================================================
    // Terminal I/O
    // =========================================================================

    fn prompt(&mut self) -> Result<(), ShellError> {
        match self.client.credentials().username() {
            Some(username) => write!(self.output, "{username}> ")?,
            None => write!(self.output, "> ")?,
        }
        self.output.flush()?;
        Ok(())
    }

    /// Read one line without its line ending. `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>, ShellError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
    }

    fn ask(&mut self, label: &str) -> Result<String, ShellError> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;
        self.read_line()?
            .map(|value| value.trim().to_owned())
            .ok_or(ShellError::InputClosed)
    }

    fn ask_secret(&mut self, label: &str) -> Result<SecretString, ShellError> {
        if !self.hide_passwords {
            return self.ask(label).map(SecretString::from);
        }
        self.output.flush()?;
        let value = rpassword::prompt_password(format!("{label}: "))?;
        Ok(SecretString::from(value.trim().to_owned()))
    }

    /// Ask with a default; a blank answer keeps it and returns `None`.
    fn ask_with_default(
        &mut self,
        label: &str,
        default: &str,
    ) -> Result<Option<String>, ShellError> {
        let answer = self.ask(&format!("{label} [{default}]"))?;
        Ok(Some(answer).filter(|a| !a.is_empty()))
    }
}

fn parse_field<T>(value: &str, field: &'static str) -> Result<T, ShellError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ShellError::InvalidInput {
        field,
        reason: e.to_string(),
    })
}

fn display_id(product: &Product) -> &str {
    product.id().map_or("-", |id| id.as_str())
}
