use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use inkdoc_config::Config;
use inkdoc_engine::{
    Block as NoteBlock, ConverterRegistry, DEFAULT_PREVIEW_LENGTH, NoteFile, NoteSession,
    PositionMapper, Run, TextFormat, io, preview,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::{
    env,
    fs::{self, File, OpenOptions},
    io::{Stdout, stdout},
    mem,
    ops::Range,
    path::{Path, PathBuf},
    process,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
    NewNote,
}

#[derive(Debug, Clone, Copy)]
enum SearchDirection {
    Next,
    Previous,
}

struct App {
    notes_path: PathBuf,
    registry: ConverterRegistry,
    preview_length: usize,
    new_note_format: TextFormat,
    notes: Vec<NoteFile>,
    previews: Vec<String>,
    file_list_state: ListState,
    session: Option<NoteSession>,
    current_content: Vec<Line<'static>>,
    scroll: u16,
    mode: Mode,
    /// Text typed at the search or new-note prompt
    search_input: String,
    last_search: Option<String>,
    status: String,
}

impl App {
    fn new(
        notes_path: PathBuf,
        preview_length: usize,
        new_note_format: TextFormat,
    ) -> Result<Self> {
        let mut app = Self {
            notes_path,
            registry: ConverterRegistry::with_defaults(),
            preview_length,
            new_note_format,
            notes: Vec::new(),
            previews: Vec::new(),
            file_list_state: ListState::default(),
            session: None,
            current_content: Vec::new(),
            scroll: 0,
            mode: Mode::Browse,
            search_input: String::new(),
            last_search: None,
            status: String::new(),
        };

        app.reload_notes()?;
        log::info!(
            "Found {} notes in {}",
            app.notes.len(),
            app.notes_path.display()
        );

        // Select first note if available
        if !app.notes.is_empty() {
            app.file_list_state.select(Some(0));
            app.update_content_for_selection();
        }

        Ok(app)
    }

    fn reload_notes(&mut self) -> Result<()> {
        self.notes = io::scan_note_files(&self.notes_path)
            .with_context(|| format!("Failed to scan {}", self.notes_path.display()))?;
        self.previews = self
            .notes
            .iter()
            .map(|note| match io::read_note(note, &self.notes_path, &self.registry) {
                Ok(tree) => preview::extract(&tree, self.preview_length).replace('\n', " "),
                Err(e) => {
                    log::warn!("Could not preview {}: {e}", note.relative_path());
                    format!("(unreadable: {e})")
                }
            })
            .collect();
        Ok(())
    }

    fn next_file(&mut self) {
        if self.notes.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(i) => (i + 1) % self.notes.len(),
            None => 0,
        };
        self.file_list_state.select(Some(i));
        self.update_content_for_selection();
    }

    fn previous_file(&mut self) {
        if self.notes.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(0) | None => self.notes.len() - 1,
            Some(i) => i - 1,
        };
        self.file_list_state.select(Some(i));
        self.update_content_for_selection();
    }

    fn update_content_for_selection(&mut self) {
        let Some(note) = self
            .file_list_state
            .selected()
            .and_then(|index| self.notes.get(index))
        else {
            return;
        };

        self.status.clear();
        self.scroll = 0;
        let opened = io::read_file(note.relative_path(), &self.notes_path)
            .map_err(|e| format!("Error reading file: {e}"))
            .and_then(|content| {
                NoteSession::open(&self.registry, &content, note.format())
                    .map_err(|e| format!("Error parsing note: {e}"))
            });

        match opened {
            Ok(session) => {
                self.current_content = render_note(&session).lines;
                self.session = Some(session);
            }
            Err(message) => {
                self.current_content = vec![Line::from(message)];
                self.session = None;
            }
        }
    }

    fn start_prompt(&mut self, mode: Mode) {
        self.mode = mode;
        self.search_input.clear();
    }

    fn submit_new_note(&mut self) {
        self.mode = Mode::Browse;
        let name = mem::take(&mut self.search_input);
        let created = io::create_note(
            &self.notes_path,
            &name,
            self.new_note_format,
            &self.registry,
        )
        .map_err(anyhow::Error::from)
        .and_then(|note| {
            self.reload_notes()?;
            Ok(note)
        });

        match created {
            Ok(note) => {
                let index = self.notes.iter().position(|n| n == &note);
                self.file_list_state.select(index);
                self.update_content_for_selection();
                self.status = format!("Created {}", note.relative_path());
            }
            Err(e) => self.status = format!("Could not create note: {e}"),
        }
    }

    fn submit_search(&mut self) {
        self.mode = Mode::Browse;
        if self.search_input.is_empty() {
            return;
        }
        self.last_search = Some(mem::take(&mut self.search_input));
        self.search(SearchDirection::Next);
    }

    fn search(&mut self, direction: SearchDirection) {
        let (Some(session), Some(target)) = (self.session.as_mut(), self.last_search.as_deref())
        else {
            return;
        };

        let found = match direction {
            SearchDirection::Next => session.find_next(target),
            SearchDirection::Previous => session.find_previous(target),
        };
        self.status = match found {
            Some(_) => format!("Found \"{target}\""),
            None => format!("No more matches for \"{target}\""),
        };

        let rendered = render_note(session);
        self.scroll = rendered
            .highlight_line
            .map(|line| line.saturating_sub(3) as u16)
            .unwrap_or(self.scroll);
        self.current_content = rendered.lines;
    }
}

/// A note laid out as terminal lines, with the selected text highlighted.
struct RenderedNote {
    lines: Vec<Line<'static>>,
    highlight_line: Option<usize>,
}

/// Builds lines while tracking the linear offset, so selection offsets from
/// the position mapper can be matched against each character.
struct LineBuilder {
    highlight: Option<Range<usize>>,
    offset: usize,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    highlight_line: Option<usize>,
}

impl LineBuilder {
    fn new(highlight: Option<Range<usize>>) -> Self {
        Self {
            highlight,
            offset: 0,
            lines: Vec::new(),
            spans: Vec::new(),
            highlight_line: None,
        }
    }

    fn text(&mut self, text: &str) {
        for ch in text.chars() {
            let highlighted = self
                .highlight
                .as_ref()
                .is_some_and(|range| range.contains(&self.offset));
            let style = if highlighted {
                self.highlight_line.get_or_insert(self.lines.len());
                Style::default()
                    .bg(Color::Yellow)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            match self.spans.last_mut() {
                Some(span) if span.style == style => span.content.to_mut().push(ch),
                _ => self.spans.push(Span::styled(ch.to_string(), style)),
            }
            self.offset += 1;
        }
    }

    fn line_break(&mut self) {
        self.end_line();
        self.offset += 1;
    }

    fn block_boundary(&mut self) {
        self.end_line();
        self.lines.push(Line::default());
        self.offset += 2;
    }

    fn image(&mut self, bytes: usize) {
        let label = if bytes == 0 {
            "[image unavailable]".to_string()
        } else {
            format!("[image, {bytes} bytes]")
        };
        self.spans.push(Span::styled(
            label,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    fn end_line(&mut self) {
        self.lines.push(Line::from(mem::take(&mut self.spans)));
    }

    fn finish(mut self) -> RenderedNote {
        self.end_line();
        RenderedNote {
            lines: self.lines,
            highlight_line: self.highlight_line,
        }
    }
}

fn render_note(session: &NoteSession) -> RenderedNote {
    let tree = session.tree();
    let highlight = session.selection().map(|selection| {
        let mapper = PositionMapper::new(tree);
        mapper.offset_from_start(selection.start)..mapper.offset_from_start(selection.end)
    });

    let mut builder = LineBuilder::new(highlight);
    for (index, block) in tree.blocks().enumerate() {
        if index > 0 {
            builder.block_boundary();
        }
        match block {
            NoteBlock::Paragraph(paragraph) => {
                for run in &paragraph.runs {
                    match run {
                        Run::Text(text) => builder.text(text),
                        Run::LineBreak => builder.line_break(),
                    }
                }
            }
            NoteBlock::Image(image) => builder.image(image.bytes.len()),
        }
    }
    builder.finish()
}

/// Stderr shares the terminal with the UI, so log lines go to a file. When
/// the file cannot be opened logging is switched off.
fn init_logging(log_path: &Path) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match open_log_file(log_path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!(
                "Warning: cannot open log file '{}', logging disabled: {e}",
                log_path.display()
            );
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn open_log_file(log_path: &Path) -> std::io::Result<File> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(log_path)
}

fn main() -> Result<()> {
    init_logging(&Config::log_path());

    // Determine notes path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let notes_path;
    let from_config;
    let mut preview_length = DEFAULT_PREVIEW_LENGTH;
    let mut new_note_format = TextFormat::Markup;

    if args.len() == 2 {
        // CLI argument provided - use it, but still honour the other config settings
        notes_path = PathBuf::from(&args[1]);
        from_config = false;
        match Config::load() {
            Ok(Some(config)) => {
                preview_length = config.preview_length;
                new_note_format = config.default_format;
            }
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring config file: {e}"),
        }
    } else if args.len() == 1 {
        // No CLI argument - try config file
        match Config::load() {
            Ok(Some(config)) => {
                notes_path = config.notes_path;
                preview_length = config.preview_length;
                new_note_format = config.default_format;
                from_config = true;
            }
            Ok(None) => {
                eprintln!("Error: No notes path provided and no config file found");
                eprintln!("Usage: {} <notes-folder-path>", args[0]);
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} <notes-folder-path>", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [notes-folder-path]", args[0]);
        process::exit(1);
    };

    // Validate notes directory using engine
    if let Err(e) = io::validate_notes_dir(&notes_path) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Notes path '{}'{} is invalid: {e}",
            notes_path.display(),
            source
        );
        process::exit(1);
    }

    // Scan before taking over the terminal so failures print normally
    let mut app = App::new(notes_path, preview_length, new_note_format)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };

        match app.mode {
            Mode::Search | Mode::NewNote => match key.code {
                KeyCode::Enter if app.mode == Mode::Search => app.submit_search(),
                KeyCode::Enter => app.submit_new_note(),
                KeyCode::Esc => app.mode = Mode::Browse,
                KeyCode::Backspace => {
                    app.search_input.pop();
                }
                KeyCode::Char(c) => app.search_input.push(c),
                _ => {}
            },
            Mode::Browse => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_file(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_file(),
                KeyCode::Char('/') => app.start_prompt(Mode::Search),
                KeyCode::Char('a') => app.start_prompt(Mode::NewNote),
                KeyCode::Char('n') => app.search(SearchDirection::Next),
                KeyCode::Char('N') => app.search(SearchDirection::Previous),
                _ => {}
            },
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(rows[0]);

    // Note list panel
    let note_items: Vec<ListItem> = app
        .notes
        .iter()
        .zip(&app.previews)
        .map(|(note, preview)| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    note.display_path().to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    preview.clone(),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let notes_list = List::new(note_items)
        .block(Block::default().borders(Borders::ALL).title("Notes"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(notes_list, chunks[0], &mut app.file_list_state);

    // Content panel
    let title = app
        .file_list_state
        .selected()
        .and_then(|index| app.notes.get(index))
        .map_or_else(|| "Content".to_string(), |note| note.display_name().to_string());
    let content_text = if app.current_content.is_empty() {
        vec![Line::from("Select a note to view its content")]
    } else {
        app.current_content.clone()
    };

    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));

    f.render_widget(content, chunks[1]);

    // Prompt or instructions at the bottom
    let bottom = match app.mode {
        Mode::Search => Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(app.search_input.clone()),
        ]),
        Mode::NewNote => Line::from(vec![
            Span::styled(
                format!("New {} note: ", app.new_note_format),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(app.search_input.clone()),
        ]),
        Mode::Browse => {
            let mut spans = vec![
                Span::raw("q: Quit | "),
                Span::raw("↑/k: Previous | "),
                Span::raw("↓/j: Next | "),
                Span::raw("/: Search | n/N: Next/Previous match | "),
                Span::raw("a: New note"),
            ];
            if !app.status.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", app.status),
                    Style::default().fg(Color::Cyan),
                ));
            }
            Line::from(spans)
        }
    };

    f.render_widget(Paragraph::new(vec![bottom]), rows[1]);
}
