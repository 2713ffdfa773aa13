use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode, Tab};
use crate::components::list::EntryListWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tabs::{TabLabel, TabsBarWidget};
use crate::components::tree::RepoTreeWidget;
use crate::theme::ThemeColors;
use crate::vcs::classifier::LineClassifier;
use crate::vcs::list::{ListRefresher, RefreshState};

fn key_hints(tab: Tab) -> &'static str {
    match tab {
        Tab::Status => " a:add d:del v:revert R:resolved p:props u:update ",
        Tab::Repository => " ⏎:open n:rename m:mkdir c:copy p:props r:refresh ",
        Tab::Update | Tab::Output => " K:cancel r:refresh q:quit ",
        Tab::Properties => " r:refresh q:quit ",
    }
}

fn empty_text(tab: Tab) -> &'static str {
    match tab {
        Tab::Status => "(no local changes)",
        Tab::Update => "(press u to update the working copy)",
        Tab::Properties => "(press p on a file to list its properties)",
        Tab::Output | Tab::Repository => "(no output)",
    }
}

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Tabs
    let labels: Vec<TabLabel> = Tab::ALL
        .iter()
        .map(|tab| TabLabel {
            title: tab.title(),
            busy: app.is_tab_busy(*tab),
        })
        .collect();
    frame.render_widget(
        TabsBarWidget::new(&labels, app.tab.index(), &app.theme),
        chunks[0],
    );

    // Current view
    let visible_height = chunks[1].height.saturating_sub(2) as usize;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_fg));

    match app.tab {
        Tab::Repository => {
            app.tree.update_scroll(visible_height);
            let widget = RepoTreeWidget::new(&app.tree, &app.theme, Utc::now())
                .block(block.title(" Repository "));
            frame.render_widget(widget, chunks[1]);
        }
        Tab::Status => render_list(frame, chunks[1], &mut app.status, &app.theme, block, Tab::Status),
        Tab::Update => render_list(frame, chunks[1], &mut app.update, &app.theme, block, Tab::Update),
        Tab::Properties => render_list(
            frame,
            chunks[1],
            &mut app.properties,
            &app.theme,
            block,
            Tab::Properties,
        ),
        Tab::Output => render_list(frame, chunks[1], &mut app.output, &app.theme, block, Tab::Output),
    }

    // Status bar
    let location = location(app);
    let info = info(app);
    let mut bar = StatusBarWidget::new(&location, &info, &app.theme).key_hints(key_hints(app.tab));
    if let AppMode::Prompt(kind) = &app.mode {
        bar = bar.prompt(kind.label(), &app.prompt_state.input);
    } else if let Some(msg) = &app.status_message {
        bar = bar.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(bar, chunks[2]);
}

fn render_list<C: LineClassifier>(
    frame: &mut Frame,
    area: Rect,
    list: &mut ListRefresher<C>,
    theme: &ThemeColors,
    block: Block,
    tab: Tab,
) {
    list.update_scroll(area.height.saturating_sub(2) as usize);

    // The status view always runs the same command; the others show theirs.
    let mut title = format!(" {}", tab.title());
    if tab != Tab::Status {
        if let Some(source) = list.source() {
            title.push_str(": ");
            title.push_str(&source.command);
        }
    }
    if list.state() == RefreshState::Streaming {
        title.push_str(" (running)");
    }
    title.push(' ');

    let widget = EntryListWidget::new(list.entries(), list.selected_index, list.scroll_offset, theme)
        .block(block.title(title))
        .placeholder(empty_text(tab));
    frame.render_widget(widget, area);
}

/// The path the cursor points at, or the viewer's root.
fn location(app: &App) -> String {
    let current = match app.tab {
        Tab::Repository => app.tree.selected_path().map(str::to_string),
        Tab::Status => app
            .status
            .current()
            .filter(|e| !e.sort_key.is_empty())
            .map(|e| e.sort_key.clone()),
        _ => None,
    };
    current.unwrap_or_else(|| match app.working_copy() {
        Some(wc) => wc.display().to_string(),
        None => app
            .tree
            .node(app.tree.root())
            .map(|n| n.repo_path.clone())
            .unwrap_or_default(),
    })
}

fn info(app: &App) -> String {
    if let Some(action) = app.actions.current() {
        return format!("{}… ", action.kind.label());
    }
    match app.marked_count() {
        0 => String::new(),
        n => format!("{n} marked "),
    }
}
