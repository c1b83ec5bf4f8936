//! HTML rendering of alert notifications

use std::fmt::Write as _;

use crate::models::{AlertCondition, AlertKind, AlertRecord, NotificationPayload};

const CELL_STYLE: &str = "padding: 10px; border: 1px solid #ddd;";
const HEADER_STYLE: &str =
    "text-align: left; padding: 10px; background: #f1f1f1; border: 1px solid #ddd;";

struct Template {
    heading: &'static str,
    intro: &'static str,
    columns: &'static [&'static str],
    closing: &'static str,
}

fn template(kind: AlertKind) -> Template {
    match kind {
        AlertKind::PendingBills => Template {
            heading: "AutoInven - Pending Bill Alert",
            intro: "🚨 The following bills are pending payment:",
            columns: &["Institution Name", "Description", "Amount"],
            closing: "🛒 Please process the payments for the above bills.",
        },
        AlertKind::LowStock => Template {
            heading: "AutoInven - Inventory Management",
            intro: "🚨 Attention! The following items need restocking:",
            columns: &["Product Name", "Category", "Quantity", "Vendor"],
            closing: "🛒 Please consider placing a new order for the above items to ensure smooth operations.",
        },
    }
}

/// Build the notification for `records` matched by `condition`, one table
/// row per record in the order given.
///
/// With `inline_logo` set the document references an attachment with
/// Content-ID `logo`.
pub fn render(
    condition: &AlertCondition,
    records: &[AlertRecord],
    recipient: &str,
    inline_logo: bool,
) -> NotificationPayload {
    let kind = condition.kind;
    let template = template(kind);
    let rows: Vec<Vec<String>> = records.iter().map(AlertRecord::cells).collect();

    let html_body = render_html(&template, &rows, inline_logo);

    NotificationPayload {
        recipient: recipient.to_string(),
        subject: kind.subject().to_string(),
        heading: template.heading.to_string(),
        intro: template.intro.to_string(),
        columns: template.columns.to_vec(),
        rows,
        closing: template.closing.to_string(),
        html_body,
    }
}

fn render_html(template: &Template, rows: &[Vec<String>], inline_logo: bool) -> String {
    let mut html = String::with_capacity(2048 + rows.len() * 256);

    html.push_str(
        "<html>\n<body style=\"font-family: Arial, sans-serif; background-color: #f9f9f9; padding: 20px;\">\n\
         <div style=\"max-width: 600px; margin: auto; background: #ffffff; border-radius: 10px; padding: 20px; box-shadow: 0 0 10px rgba(0,0,0,0.1);\">\n\
         <div style=\"text-align: center; padding-bottom: 20px;\">\n",
    );
    if inline_logo {
        html.push_str(
            "<img src=\"cid:logo\" alt=\"AutoInven Logo\" style=\"max-width: 110px; height: 110px; border-radius: 50%;\" />\n",
        );
    }
    let _ = writeln!(html, "<h2 style=\"color: #333;\">{}</h2>", escape(template.heading));
    let _ = writeln!(html, "<p style=\"color: #555;\">{}</p>", escape(template.intro));
    html.push_str(
        "</div>\n<table style=\"width: 100%; border-collapse: collapse; margin-top: 20px;\">\n<thead>\n<tr>\n",
    );

    for column in template.columns {
        let _ = writeln!(html, "<th style=\"{HEADER_STYLE}\">{}</th>", escape(column));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in rows {
        html.push_str("<tr>\n");
        for cell in row {
            let _ = writeln!(html, "<td style=\"{CELL_STYLE}\">{}</td>", escape(cell));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n");
    let _ = writeln!(
        html,
        "<p style=\"color: #333; text-align: center; margin-top: 20px;\">{}</p>",
        escape(template.closing)
    );
    html.push_str(
        "<footer style=\"text-align: center; margin-top: 30px; color: #777; font-size: 12px;\">\n\
         <p>© AutoInven - All rights reserved.</p>\n</footer>\n</div>\n</body>\n</html>\n",
    );

    html
}

/// Escape text for use inside HTML element content
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
