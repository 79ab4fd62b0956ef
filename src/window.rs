use {
    super::*,
    crossterm::{
        ExecutableCommand, QueueableCommand, cursor,
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        style::{self, Stylize},
        terminal,
    },
    std::time::{Duration, Instant},
};

/// the terminal, while it is taken over by the dashboard.
///
/// the terminal is restored when this is dropped.
struct Screen;

impl<C, S> App<C, S>
where
    C: Clock,
    S: CounterSource,
{
    /// runs the dashboard until a quit key is pressed.
    pub fn tui(mut self) -> Result<(), AppError> {
        let _screen = Screen::enter()?;

        loop {
            let start = Instant::now();

            self.tick();
            self.draw()?;

            let remaining = self.poller.interval().saturating_sub(start.elapsed());
            if Self::wait_for_quit(remaining)? {
                log::debug!("quitting");
                return Ok(());
            }
        }
    }

    fn draw(&self) -> Result<(), io::Error> {
        let (cols, rows) = terminal::size()?;
        let mut stdout = io::stdout();

        Self::clear()?;
        Self::border(cols, rows)?;

        let width = cols.saturating_sub(4) as usize;
        let bottom = rows.saturating_sub(1);
        let mut y = 1;

        let header = self.host.header();
        for line in &header {
            if y >= bottom {
                break;
            }
            stdout
                .queue(cursor::MoveTo(2, y))?
                .queue(style::PrintStyledContent(Self::fit(line, width).cyan()))?;
            y += 1;
        }
        if !header.is_empty() {
            y += 1;
        }

        for (title, body) in self.sections() {
            if y >= bottom {
                break;
            }
            stdout
                .queue(cursor::MoveTo(2, y))?
                .queue(style::PrintStyledContent(Self::fit(&title, width).bold()))?;
            y += 1;

            for line in body {
                if y >= bottom {
                    break;
                }
                let line = Self::fit(&line, width);
                let line = if line.ends_with(panel::STALE) || line == panel::NO_DATA {
                    line.dark_grey()
                } else {
                    line.green()
                };
                stdout
                    .queue(cursor::MoveTo(2, y))?
                    .queue(style::PrintStyledContent(line))?;
                y += 1;
            }

            // a blank line between sections.
            y += 1;
        }

        stdout.flush()
    }

    /// each domain's graph, then its latest report, as titled lines.
    fn sections(&self) -> Vec<(String, Vec<String>)> {
        let Self { poller, history, .. } = self;

        Domain::ALL
            .into_iter()
            .flat_map(|domain| {
                let graph = panel::graph(history.graph(domain));
                let report = panel::report(domain, poller.latest(domain));
                [
                    (panel::graph_title(domain).to_owned(), graph),
                    (panel::title(domain), report),
                ]
            })
            .map(|(title, section)| {
                let mut lines = section.render(&title).into_iter();
                let title = lines.next().unwrap_or(title);
                (title, lines.collect())
            })
            .collect()
    }

    /// waits up to `timeout` for a quit key.
    fn wait_for_quit(timeout: Duration) -> Result<bool, io::Error> {
        // an interval too long to add to the current instant is waited out in full.
        let deadline = Instant::now().checked_add(timeout);

        loop {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            if !event::poll(remaining)? {
                return Ok(false);
            }
            if let Event::Key(key) = event::read()? {
                if Self::is_quit(key) {
                    return Ok(true);
                }
            }
        }
    }

    fn is_quit(
        KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }: KeyEvent,
    ) -> bool {
        if kind != KeyEventKind::Press {
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => true,
            KeyCode::Char('c') => modifiers.contains(KeyModifiers::CONTROL),
            _ => false,
        }
    }

    /// truncates a line to the drawable width.
    fn fit(line: &str, width: usize) -> String {
        line.chars().take(width).collect()
    }

    /// clears the screen.
    fn clear() -> Result<(), io::Error> {
        io::stdout()
            .queue(terminal::Clear(terminal::ClearType::All))
            .map(drop)
    }

    fn border(cols: u16, rows: u16) -> Result<(), io::Error> {
        let mut stdout = io::stdout();
        for y in 0..rows {
            for x in 0..cols {
                if (y == 0 || y == rows - 1) || (x == 0 || x == cols - 1) {
                    // queue every cell, and flush once the frame is drawn.
                    stdout
                        .queue(cursor::MoveTo(x, y))?
                        .queue(style::PrintStyledContent("█".grey()))?;
                }
            }
        }

        Ok(())
    }
}

// === impl Screen ===

impl Screen {
    fn enter() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        io::stdout()
            .execute(terminal::EnterAlternateScreen)?
            .execute(cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout
            .execute(cursor::Show)
            .and_then(|stdout| stdout.execute(terminal::LeaveAlternateScreen));
        let _ = terminal::disable_raw_mode();
    }
}
