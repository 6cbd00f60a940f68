use anyhow::{Context, Result};
use minijinja::{Environment, context};

use kiabom_sch::bom::BomTable;

const HTML_TEMPLATE: &str = include_str!("bom.html.jinja");

pub fn render(table: &BomTable, title: &str) -> Result<String> {
    let mut env = Environment::new();
    // The `.html` name turns on auto-escaping.
    env.add_template("bom.html", HTML_TEMPLATE)
        .context("Failed to add HTML template")?;

    let template = env.get_template("bom.html")?;
    let html = template
        .render(context! {
            title,
            table,
        })
        .context("Failed to render HTML template")?;

    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures;

    #[test]
    fn test_render_html() {
        let html = render(&fixtures::table(), "KiABOM Bill Of Materials").unwrap();
        assert!(html.contains("<title>KiABOM Bill Of Materials</title>"));
        assert!(html.contains("<p>Board Quantity: 1</p>"));
        assert!(html.contains(
            "<tr><th>Designator</th><th>Value</th><th>Total Price</th></tr>"
        ));
        assert!(html.contains("<tr><td>R1,R2</td><td>10k</td><td>0.10</td></tr>"));
        assert!(html.contains("<td>1uF &quot;X7R&quot;</td>"));
        assert!(html.contains("<tr><td>Total Price Sum:</td><td>0.20</td></tr>"));
        assert!(!html.contains("<td>Board Quantity:</td>"));
    }
}
