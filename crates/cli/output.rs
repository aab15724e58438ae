use colored_json::ToColoredJson;
use hltb_core::{GameResult, SearchResultPage};
use serde_json::json;
use tabled::{Table, Tabled, settings::Style};

pub fn format_hours(hours: Option<f64>) -> String {
    match hours {
        Some(h) => format!("{h:.1}h"),
        None => "N/A".to_string(),
    }
}

pub fn print_pretty_json(page: &SearchResultPage, limit: usize) {
    let results: Vec<&GameResult> = page.results.iter().take(limit).collect();
    let value = json!({
        "results": results,
        "count": results.len(),
        "total_count": page.total_count,
        "current_page": page.current_page,
        "last_page": page.last_page,
    });
    match serde_json::to_string_pretty(&value) {
        Ok(s) => match s.to_colored_json_auto() {
            Ok(cs) => println!("{cs}"),
            Err(_) => println!("{s}"),
        },
        Err(e) => eprintln!("failed to serialize results: {e}"),
    }
}

pub fn print_table(page: &SearchResultPage, limit: usize) {
    if page.results.is_empty() {
        println!("No results.");
        return;
    }
    let rows: Vec<DisplayRow> = page.results.iter().take(limit).map(DisplayRow::from).collect();
    if std::env::var("NO_TABLE").ok().as_deref() == Some("1") {
        for r in &rows {
            println!(
                "- {} [{}] main {} | extras {} | completionist {} | {}",
                r.name, r.id, r.main, r.extras, r.completionist, r.platforms
            );
        }
    } else {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
    println!(
        "Page {}/{} ({} total)",
        page.current_page, page.last_page, page.total_count
    );
}

#[derive(Clone, Tabled)]
struct DisplayRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Game")]
    name: String,
    #[tabled(rename = "Main Story")]
    main: String,
    #[tabled(rename = "Main + Extras")]
    extras: String,
    #[tabled(rename = "Completionist")]
    completionist: String,
    #[tabled(rename = "Platforms")]
    platforms: String,
}

impl From<&GameResult> for DisplayRow {
    fn from(g: &GameResult) -> Self {
        let name = match &g.alias {
            Some(alias) => format!("{} ({alias})", g.name),
            None => g.name.clone(),
        };
        Self {
            id: g.id.clone(),
            name,
            main: format_hours(g.main_story_hours),
            extras: format_hours(g.extras_hours),
            completionist: format_hours(g.completionist_hours),
            platforms: if g.platforms.is_empty() {
                "N/A".to_string()
            } else {
                g.platforms.join(", ")
            },
        }
    }
}
