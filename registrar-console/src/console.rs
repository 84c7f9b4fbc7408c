//! Interactive console loop

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use registrar_lib::RegistrarClient;
use registrar_lib::auth::PasswordFlow;
use registrar_lib::auth::Session;
use registrar_lib::error::AuthError;
use registrar_lib::model::Fields;
use registrar_lib::model::RowId;
use registrar_lib::model::Value;
use registrar_lib::render::FieldChange;
use registrar_lib::render::FormControl;
use registrar_lib::render::FormRenderer;
use registrar_lib::render::FormState;
use registrar_lib::render::TableEvent;
use registrar_lib::render::TableRenderer;
use registrar_lib::table::ConfirmPrompt;
use registrar_lib::table::Confirmation;
use registrar_lib::table::EventOutcome;
use registrar_lib::table::LoadingFlag;
use registrar_lib::table::Notice;
use registrar_lib::table::NoticeLevel;
use registrar_lib::table::Notifier;
use registrar_lib::table::PageSize;
use registrar_lib::table::SyncEngine;
use registrar_lib::table::TableModel;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::io::Lines;
use tokio::io::Stdin;
use tokio::sync::Mutex;
use tokio::sync::watch;

use crate::command::Command;
use crate::command::HELP;
use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::pages::Page;
use crate::print;

/// How long a request may run before "loading…" is shown.
const LOADING_HINT_DELAY: Duration = Duration::from_millis(400);

/// Sign-in attempts before giving up.
const MAX_SIGN_IN_ATTEMPTS: usize = 3;

/// Typed in a form or editor to abandon it.
const CANCEL: &str = "!";
/// Typed in a form or editor to clear a field.
const CLEAR: &str = "-";

// =============================================================================
// Prompter
// =============================================================================

/// Line reader over stdin, shared by the loop and by confirmation prompts.
pub struct Prompter {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl Prompter {
    pub fn stdin() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Prints `prompt` and reads one line. `None` at end of input.
    pub async fn read_line(&self, prompt: &str) -> std::io::Result<Option<String>> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        let line = self.lines.lock().await.next_line().await?;
        Ok(line.map(|l| l.trim_end_matches('\r').to_string()))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "д" | "да")
}

#[async_trait]
impl Confirmation for Prompter {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        let question = format!("{}: {} [y/N] ", prompt.title, prompt.message);
        match self.read_line(&question).await {
            Ok(Some(answer)) => is_yes(&answer),
            Ok(None) => false,
            Err(e) => {
                log::warn!("Failed to read confirmation: {}", e);
                false
            }
        }
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// Prints engine notices to stderr as they arrive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let mark = match notice.level {
            NoticeLevel::Info => "·",
            NoticeLevel::Success => "✓",
            NoticeLevel::Warning => "!",
            NoticeLevel::Error => "✗",
        };
        match &notice.body {
            Some(body) => eprintln!("{} {}: {}", mark, notice.title, body),
            None => eprintln!("{} {}", mark, notice.title),
        }
    }
}

/// Prints a hint when a request takes a while.
fn spawn_loading_hint(mut loading: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while loading.changed().await.is_ok() {
            if !*loading.borrow_and_update() {
                continue;
            }
            tokio::time::sleep(LOADING_HINT_DELAY).await;
            if *loading.borrow() {
                eprintln!("loading…");
            }
        }
    })
}

// =============================================================================
// Console
// =============================================================================

enum Flow {
    Continue,
    Quit,
}

/// One interactive session against the records service.
pub struct Console {
    client: RegistrarClient,
    session: Session,
    config: ConsoleConfig,
    prompter: Arc<Prompter>,
    notifier: Arc<ConsoleNotifier>,
    loading: LoadingFlag,
    renderer: TableRenderer,
    engines: HashMap<Page, SyncEngine>,
    /// Add forms left open by a failed submit, keyed by page.
    forms: HashMap<Page, FormState>,
    current: Page,
}

impl Console {
    pub fn new(client: RegistrarClient, session: Session, config: ConsoleConfig) -> Self {
        let renderer = TableRenderer::new(config.ui.locale);
        Self {
            client,
            session,
            config,
            prompter: Arc::new(Prompter::stdin()),
            notifier: Arc::new(ConsoleNotifier),
            loading: LoadingFlag::new(),
            renderer,
            engines: HashMap::new(),
            forms: HashMap::new(),
            current: Page::Users,
        }
    }

    /// Runs until `quit` or end of input.
    pub async fn run(&mut self, login: Option<String>) -> Result<(), ConsoleError> {
        let hint = spawn_loading_hint(self.loading.subscribe());

        if (login.is_some() || !self.session.is_signed_in().await) && !self.sign_in(login).await? {
            hint.abort();
            return Ok(());
        }

        println!("Connected to {}. Type 'help' for commands.", self.client.base_url());
        if let Err(e) = self.open(self.current).await {
            self.report(e);
        }

        loop {
            let prompt = format!("registrar:{}> ", self.current);
            let Some(line) = self.prompter.read_line(&prompt).await? else {
                println!();
                break;
            };

            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            };

            log::debug!("Command: {:?}", command);
            match self.execute(command).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) if e.is_auth() => {
                    eprintln!("Sign in required: {}", e);
                    if !self.sign_in(None).await? {
                        break;
                    }
                    if let Err(e) = self.refresh().await {
                        self.report(e);
                    }
                }
                Err(e) => self.report(e),
            }
        }

        hint.abort();
        Ok(())
    }

    fn report(&self, err: ConsoleError) {
        match err {
            // Already shown by the notifier.
            ConsoleError::Sync(e) => log::debug!("Command failed: {}", e),
            other => eprintln!("{}", other),
        }
    }

    async fn execute(&mut self, command: Command) -> Result<Flow, ConsoleError> {
        match command {
            Command::Open(page) => self.open(page).await?,
            Command::Refresh => self.refresh().await?,
            Command::Search(term) => {
                self.engine().await?.model().await.view_mut().set_search(term);
                self.show().await?;
            }
            Command::Size(size) => {
                let size = PageSize::try_from(size)?;
                self.engine().await?.model().await.view_mut().set_page_size(size);
                self.show().await?;
            }
            Command::Next => self.turn_page(|m| m.next_page(), "Already on the last page").await?,
            Command::Prev => self.turn_page(|m| m.prev_page(), "Already on the first page").await?,
            Command::Page(page) => self.turn_page(move |m| m.go_to_page(page), "No such page").await?,
            Command::Select(ids) => self.check(ids, true).await?,
            Command::Unselect(ids) => self.check(ids, false).await?,
            Command::SelectAll => self.check_all(true).await?,
            Command::SelectNone => self.check_all(false).await?,
            Command::Set { id, key, value } => self.set(id, &key, &value).await?,
            Command::Edit(id) => self.edit(id).await?,
            Command::Pending => self.pending().await?,
            Command::Save => {
                if self.engine().await?.save().await? == 0 {
                    println!("No changes to save");
                }
                self.show().await?;
            }
            Command::Add => self.add().await?,
            Command::Delete => {
                let engine = self.engine().await?;
                if engine.delete_selected(self.prompter.as_ref()).await? == 0 {
                    println!("Nothing deleted");
                }
                self.show().await?;
            }
            Command::Group(id) => self.group(id).await?,
            Command::Enroll { student, group } => {
                let engine = self.engine_for(Page::Students).await?;
                engine.add_student_to_group(&student, &group).await?;
                if self.current == Page::Students {
                    self.show().await?;
                }
            }
            Command::Logout => {
                self.client.sign_out().await;
                println!("Signed out");
                if !self.sign_in(None).await? {
                    return Ok(Flow::Quit);
                }
                self.refresh().await?;
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return self.quit().await,
        }
        Ok(Flow::Continue)
    }

    // =========================================================================
    // Engines
    // =========================================================================

    /// Engine of the current page.
    async fn engine(&mut self) -> Result<SyncEngine, ConsoleError> {
        self.engine_for(self.current).await
    }

    /// Engine of `page`, created and loaded on first use.
    async fn engine_for(&mut self, page: Page) -> Result<SyncEngine, ConsoleError> {
        if let Some(engine) = self.engines.get(&page) {
            return Ok(engine.clone());
        }

        let model = page.model(self.config.ui.page_size)?;
        let engine = SyncEngine::with_collaborators(
            self.client.clone(),
            page.resource(),
            model,
            self.notifier.clone(),
            self.loading.clone(),
        );
        self.engines.insert(page, engine.clone());
        engine.fetch().await?;
        Ok(engine)
    }

    async fn open(&mut self, page: Page) -> Result<(), ConsoleError> {
        self.current = page;
        self.engine().await?;
        self.show().await
    }

    async fn refresh(&mut self) -> Result<(), ConsoleError> {
        let engine = self.engine().await?;
        engine.fetch().await?;
        self.show().await
    }

    async fn show(&mut self) -> Result<(), ConsoleError> {
        let engine = self.engine().await?;
        let view = self.renderer.render(&*engine.model().await);
        println!("\n{}\n{}", self.current.title(), print::table(&view));
        Ok(())
    }

    // =========================================================================
    // View and selection
    // =========================================================================

    async fn turn_page(
        &mut self,
        turn: impl FnOnce(&mut TableModel) -> bool,
        refused: &str,
    ) -> Result<(), ConsoleError> {
        let moved = turn(&mut *self.engine().await?.model().await);
        if moved {
            self.show().await
        } else {
            println!("{}", refused);
            Ok(())
        }
    }

    async fn check(&mut self, ids: Vec<RowId>, checked: bool) -> Result<(), ConsoleError> {
        let engine = self.engine().await?;
        {
            let mut model = engine.model().await;
            for id in ids {
                if let Err(e) = model.apply(TableEvent::RowChecked { id, checked }) {
                    eprintln!("{}", e);
                }
            }
        }
        self.show().await
    }

    async fn check_all(&mut self, checked: bool) -> Result<(), ConsoleError> {
        self.engine().await?.model().await.apply(TableEvent::AllChecked(checked))?;
        self.show().await
    }

    // =========================================================================
    // Editing
    // =========================================================================

    async fn set(&mut self, id: RowId, key: &str, raw: &str) -> Result<(), ConsoleError> {
        let engine = self.engine().await?;
        {
            let mut model = engine.model().await;
            let change = FormRenderer::new(model.schema(), self.config.ui.locale).input(key, raw)?;
            model.apply(TableEvent::CellEdited {
                id,
                key: change.key,
                value: change.value,
            })?;
        }
        self.show().await
    }

    /// Row editor: walks the row's fields, then applies or discards.
    async fn edit(&mut self, id: RowId) -> Result<(), ConsoleError> {
        let engine = self.engine().await?;
        let (schema, values) = {
            let mut model = engine.model().await;
            let EventOutcome::OpenEditor(id) = model.apply(TableEvent::RowClicked(id.clone()))? else {
                return Ok(());
            };
            let values = model.editor_values(&id).unwrap_or_default();
            (model.schema().clone(), values)
        };

        let form = FormRenderer::new(&schema, self.config.ui.locale);
        println!(
            "Editing row {} (Enter keeps a value, '{}' clears it, '{}' cancels)",
            id, CLEAR, CANCEL
        );
        let Some(changes) = self.fill(&form, &values).await? else {
            engine.model().await.discard_edits(&id);
            println!("Edits of row {} discarded", id);
            return self.show().await;
        };

        if changes.is_empty() {
            println!("No changes");
            return Ok(());
        }

        let prompt = ConfirmPrompt::new(format!("Apply {} change(s) to row {}?", changes.len(), id)).title("Edit");
        if !self.prompter.confirm(&prompt).await {
            engine.model().await.discard_edits(&id);
            println!("Edits of row {} discarded", id);
            return self.show().await;
        }

        {
            let mut model = engine.model().await;
            for change in changes {
                model.apply(TableEvent::CellEdited {
                    id: id.clone(),
                    key: change.key,
                    value: change.value,
                })?;
            }
        }
        self.show().await
    }

    /// Prompts for every editable field. `None` if the user cancelled.
    async fn fill(
        &self,
        form: &FormRenderer<'_>,
        values: &Fields,
    ) -> Result<Option<Vec<FieldChange>>, ConsoleError> {
        let mut changes = Vec::new();
        for field in form.render(values).fields {
            if let FormControl::ReadOnly { .. } = field.control {
                println!("  {}", print::field_prompt(&field));
                continue;
            }

            loop {
                let prompt = format!("  {}", print::field_prompt(&field));
                let Some(answer) = self.prompter.read_line(&prompt).await? else {
                    return Ok(None);
                };
                let answer = answer.trim();
                let change = match answer {
                    "" => break,
                    CANCEL => return Ok(None),
                    CLEAR => Ok(FieldChange {
                        key: field.key.clone(),
                        value: Value::Null,
                    }),
                    text => form.input(&field.key, text),
                };
                match change {
                    Ok(change) => {
                        changes.push(change);
                        break;
                    }
                    Err(e) => eprintln!("  {}", e),
                }
            }
        }
        Ok(Some(changes))
    }

    async fn pending(&mut self) -> Result<(), ConsoleError> {
        let engine = self.engine().await?;
        let model = engine.model().await;
        if model.edits().is_empty() {
            println!("No unsaved changes");
            return Ok(());
        }

        for id in model.edits().edited_ids() {
            let Some(patch) = model.edits().diff(id) else { continue };
            let changes: Vec<String> = patch
                .changes
                .iter()
                .map(|(key, value)| match model.schema().field(key) {
                    Some(field) => format!("{} = {}", field.title, self.renderer.cell_text(field, value)),
                    None => format!("{} = {}", key, value),
                })
                .collect();
            println!("  row {}: {}", id, changes.join(", "));
        }
        println!("{} field(s) in {} row(s)", model.edits().pending_count(), model.edits().pending_rows());
        Ok(())
    }

    /// Add form. A failed submit keeps the entered values for the next `add`.
    async fn add(&mut self) -> Result<(), ConsoleError> {
        let engine = self.engine().await?;
        let schema = engine.model().await.form_schema().clone();
        let mut form = self.forms.remove(&self.current).unwrap_or_default();
        if !form.is_open() {
            form.open(&schema);
        }

        println!(
            "New {} record (Enter keeps a value, '{}' clears it, '{}' cancels)",
            engine.resource(),
            CLEAR,
            CANCEL
        );
        let renderer = FormRenderer::new(&schema, self.config.ui.locale);
        let Some(changes) = self.fill(&renderer, form.values()).await? else {
            println!("Cancelled");
            return Ok(());
        };
        for change in changes {
            form.apply(change);
        }

        let result = engine.create(&mut form).await;
        if form.is_open() {
            self.forms.insert(self.current, form);
        }
        if let Some(row) = result? {
            println!("Created record {}", row.id());
        }
        self.show().await
    }

    // =========================================================================
    // Groups
    // =========================================================================

    async fn group(&mut self, id: RowId) -> Result<(), ConsoleError> {
        let engine = self.engine().await?;
        let Some(detail) = engine.group_detail(&id).await? else {
            println!("No group {}", id);
            return Ok(());
        };

        let largest = PageSize::ALLOWED[PageSize::ALLOWED.len() - 1];
        let mut students = Page::Students.model(PageSize::try_from(largest)?)?;
        students.replace_rows(detail.students.clone());
        let view = self.renderer.render(&students);
        println!("\n{}", print::group_card(&detail, &view));
        Ok(())
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Asks for credentials until sign-in succeeds. `false` if the user gave
    /// up or input ended.
    async fn sign_in(&mut self, login: Option<String>) -> Result<bool, ConsoleError> {
        let flow = PasswordFlow::new(self.client.base_url()).api_prefix(self.client.api_prefix());
        let mut login = login;

        for _ in 0..MAX_SIGN_IN_ATTEMPTS {
            let name = match login.take() {
                Some(name) => name,
                None => match self.prompter.read_line("Login: ").await? {
                    Some(name) if !name.trim().is_empty() => name.trim().to_string(),
                    Some(_) => continue,
                    None => return Ok(false),
                },
            };
            let Some(password) = self.prompter.read_line("Password: ").await? else {
                return Ok(false);
            };

            match flow.authenticate(&name, &password).await {
                Ok(token) => {
                    self.session.set_token(token).await;
                    log::info!("Signed in as {}", name);
                    println!("Signed in as {}", name);
                    return Ok(true);
                }
                Err(AuthError::InvalidCredentials) => eprintln!("Wrong login or password"),
                Err(e) => {
                    log::warn!("Sign-in failed: {}", e);
                    eprintln!("Sign-in failed: {}", e);
                }
            }
        }

        eprintln!("Too many failed attempts");
        Ok(false)
    }

    /// Quits, asking first if edits would be lost.
    async fn quit(&mut self) -> Result<Flow, ConsoleError> {
        let mut unsaved = 0;
        for engine in self.engines.values() {
            unsaved += engine.model().await.edits().pending_count();
        }
        if unsaved == 0 {
            return Ok(Flow::Quit);
        }

        let prompt = ConfirmPrompt::new(format!("{} unsaved change(s) will be lost. Quit anyway?", unsaved));
        if self.prompter.confirm(&prompt).await {
            Ok(Flow::Quit)
        } else {
            Ok(Flow::Continue)
        }
    }
}
