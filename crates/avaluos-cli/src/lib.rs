use avaluos_core::{Avaluo, DocumentSlot};
use avaluos_services::CellLink;

/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Yes/no/unknown rendering of the nss column
pub fn nss_label(nss: Option<bool>) -> &'static str {
    match nss {
        Some(true) => "Sí",
        Some(false) => "No",
        None => "-",
    }
}

/// Short header for a slot column, at most four characters
fn slot_header(slot: DocumentSlot) -> String {
    truncate_ascii(slot.column(), 4)
}

fn truncate_ascii(s: &str, max_len: usize) -> String {
    s.chars().take(max_len).collect()
}

/// Render records as a fixed-width table, one document mark per slot
pub fn format_table(rows: &[Avaluo]) -> String {
    let mut out = String::new();

    let mut header = format!("{:<8} {:<12} {:<30} {:<3}", "ID", "Folio SHIT", "Dirección", "NSS");
    for slot in DocumentSlot::ALL {
        header.push_str(&format!(" {:<4}", slot_header(slot)));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&"-".repeat(header.chars().count()));
    out.push('\n');

    if rows.is_empty() {
        out.push_str("Sin avalúos para los filtros actuales.\n");
        return out;
    }

    for row in rows {
        let mut line = format!(
            "{:<8} {:<12} {:<30} {:<3}",
            row.id,
            truncate_string(row.folio_shit.as_deref().unwrap_or("-"), 12),
            truncate_string(row.address.as_deref().unwrap_or("-"), 30),
            nss_label(row.nss),
        );
        for slot in DocumentSlot::ALL {
            let mark = if row.document(slot).is_some() { "x" } else { "." };
            line.push_str(&format!(" {:<4}", mark));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out.push_str(&format!("\n{} avalúo(s)\n", rows.len()));
    out
}

/// Resolved links of one row; slots without a document are skipped
pub fn format_links(row: &Avaluo, links: &[(DocumentSlot, CellLink)]) -> String {
    let mut out = String::new();
    for (slot, link) in links {
        match link {
            CellLink::Empty => continue,
            CellLink::Loading => {
                out.push_str(&format!("  {:<12} (cargando)\n", slot.label()));
            }
            CellLink::Ready(url) => {
                out.push_str(&format!("  {:<12} {}\n", slot.label(), url));
            }
        }
    }

    if out.is_empty() {
        return out;
    }
    format!(
        "{} {}\n{}",
        row.id,
        row.folio_shit.as_deref().unwrap_or("-"),
        out
    )
}
