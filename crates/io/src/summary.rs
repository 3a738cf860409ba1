// Processing summary, as HTML and plain text

use std::fmt::{self, Write as _};

use chrono::NaiveDateTime;
use faed_dedup::model::{DedupMeta, DedupStats, Rule};

use crate::export::ExportedFile;
use crate::labels::rule_label;

pub struct SummaryInput<'a> {
    pub stats: &'a DedupStats,
    pub meta: &'a DedupMeta,
    pub run_at: NaiveDateTime,
    pub input_name: &'a str,
    pub fingerprint: Option<&'a str>,
    pub files: &'a [ExportedFile],
}

/// One line of the class breakdown.
struct ClassRow<'a> {
    prefix: &'a str,
    count: usize,
    pct: f64,
    excluded: bool,
}

impl SummaryInput<'_> {
    fn classes(&self) -> Vec<ClassRow<'_>> {
        self.stats
            .class_counts
            .iter()
            .map(|(prefix, &count)| ClassRow {
                prefix,
                count,
                pct: pct(count, self.stats.total_input),
                excluded: prefix.starts_with(self.meta.excluded_prefix.as_str()),
            })
            .collect()
    }

    /// Rules that decided at least one record, in priority order.
    fn rules(&self) -> Vec<(Rule, usize, usize)> {
        Rule::ALL
            .iter()
            .filter_map(|rule| {
                let records = self.stats.records_by_rule.get(rule).copied().unwrap_or(0);
                let groups = self.stats.groups_by_rule.get(rule).copied().unwrap_or(0);
                (records > 0).then_some((*rule, groups, records))
            })
            .collect()
    }

    fn anomalies(&self) -> [(&'static str, usize); 4] {
        let a = &self.stats.anomalies;
        [
            ("Dates de création absentes", a.missing_creation_dates),
            ("Dates de création illisibles", a.unparsable_creation_dates),
            ("Numéros de procédure absents", a.missing_procedure_refs),
            ("Numéros de procédure mal formés", a.malformed_procedure_refs),
        ]
    }

    fn run_at(&self) -> String {
        self.run_at.format("%d/%m/%Y à %H:%M").to_string()
    }
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

fn file_name(file: &ExportedFile) -> String {
    file.path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "\
body { font-family: Arial, sans-serif; margin: 20px; }
h1 { color: #003366; }
h2 { color: #0066cc; margin-top: 20px; }
table { border-collapse: collapse; width: 100%; margin: 10px 0 20px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; }
.note { color: #cc0000; margin: 15px 0; }
.footer { margin-top: 30px; font-size: 0.8em; color: #666; }";

fn row(out: &mut String, cells: &[&str]) -> fmt::Result {
    out.push_str("<tr>");
    for cell in cells {
        write!(out, "<td>{}</td>", escape_html(cell))?;
    }
    out.push_str("</tr>\n");
    Ok(())
}

fn head(out: &mut String, cells: &[&str]) -> fmt::Result {
    out.push_str("<table>\n<tr>");
    for cell in cells {
        write!(out, "<th>{}</th>", escape_html(cell))?;
    }
    out.push_str("</tr>\n");
    Ok(())
}

fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn render_html(input: &SummaryInput<'_>) -> String {
    let mut out = String::new();
    // fmt::Write for String never fails.
    let _ = write_html(&mut out, input);
    out
}

fn write_html(out: &mut String, input: &SummaryInput<'_>) -> fmt::Result {
    let s = input.stats;
    let prefix = escape_html(&input.meta.excluded_prefix);

    write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>Résumé du traitement des doublons</title>\n\
         <style>\n{STYLE}\n</style>\n</head>\n<body>\n\
         <h1>Résumé du traitement des doublons de signalisations</h1>\n\
         <p><strong>Date du traitement:</strong> {}</p>\n\
         <p><strong>Fichier traité:</strong> {}</p>\n",
        escape_html(&input.run_at()),
        escape_html(input.input_name)
    )?;
    if let Some(fp) = input.fingerprint {
        writeln!(out, "<p><strong>Empreinte:</strong> <code>{}</code></p>", escape_html(fp))?;
    }
    write!(
        out,
        "<div class=\"note\"><p><strong>Note importante:</strong> les {} signalisations \
         dont l'IDPP commence par '{prefix}' ont été exclues des statistiques et des \
         rapports de suppression.</p></div>\n",
        s.excluded
    )?;

    writeln!(out, "<h2>Statistiques globales (hors {prefix})</h2>")?;
    head(out, &["Catégorie", "Nombre", "Pourcentage"])?;
    row(out, &["Signalisations analysées", &s.eligible.to_string(), "100%"])?;
    row(
        out,
        &["Signalisations à conserver", &s.conserved.to_string(), &percent(s.conserved_pct)],
    )?;
    row(
        out,
        &["Signalisations à supprimer", &s.to_delete.to_string(), &percent(s.to_delete_pct)],
    )?;
    row(out, &["Groupes de doublons identifiés", &s.duplicate_groups.to_string(), "-"])?;
    out.push_str("</table>\n");

    out.push_str("<h2>Répartition par type d'identifiant GASPARD</h2>\n");
    head(out, &["Type d'IDPP", "Nombre", "Pourcentage du total", "Traitement"])?;
    for class in input.classes() {
        let treatment =
            if class.excluded { "Exclus automatiquement" } else { "Analysés pour doublons" };
        row(out, &[class.prefix, &class.count.to_string(), &percent(class.pct), treatment])?;
    }
    out.push_str("</table>\n");

    writeln!(out, "<h2>Détail des règles appliquées (hors {prefix})</h2>")?;
    head(out, &["Règle", "Groupes", "Signalisations", "Pourcentage"])?;
    for (rule, groups, records) in input.rules() {
        let groups = if rule == Rule::Unique { "-".to_string() } else { groups.to_string() };
        let share = percent(pct(records, s.eligible));
        row(out, &[rule_label(rule), &groups, &records.to_string(), &share])?;
    }
    out.push_str("</table>\n");

    out.push_str("<h2>Anomalies de saisie</h2>\n");
    head(out, &["Anomalie", "Nombre"])?;
    for (label, count) in input.anomalies() {
        row(out, &[label, &count.to_string()])?;
    }
    out.push_str("</table>\n");

    out.push_str("<h2>Fichiers générés</h2>\n");
    head(out, &["Fichier", "Signalisations"])?;
    for file in input.files {
        let count = file.records.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
        row(out, &[&file_name(file), &count])?;
    }
    out.push_str("</table>\n");

    write!(
        out,
        "<div class=\"footer\"><p>faed {} · règle UNA {} · identité stricte {}</p></div>\n\
         </body>\n</html>\n",
        escape_html(&input.meta.engine_version),
        escape_html(&input.meta.una_rule),
        if input.meta.strict_identity { "oui" } else { "non" }
    )
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

pub fn render_text(input: &SummaryInput<'_>) -> String {
    let mut out = String::new();
    // fmt::Write for String never fails.
    let _ = write_text(&mut out, input);
    out
}

fn write_text(out: &mut String, input: &SummaryInput<'_>) -> fmt::Result {
    let s = input.stats;
    let prefix = &input.meta.excluded_prefix;

    writeln!(out, "RÉSUMÉ DU TRAITEMENT DES DOUBLONS DE SIGNALISATIONS")?;
    writeln!(out, "===================================================")?;
    writeln!(out, "Date du traitement : {}", input.run_at())?;
    writeln!(out, "Fichier traité     : {}", input.input_name)?;
    if let Some(fp) = input.fingerprint {
        writeln!(out, "Empreinte          : {fp}")?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Note : les {} signalisations dont l'IDPP commence par '{prefix}' ont été exclues.",
        s.excluded
    )?;

    writeln!(out, "\nSTATISTIQUES GLOBALES (hors {prefix})")?;
    writeln!(out, "- Signalisations analysées      : {}", s.eligible)?;
    writeln!(
        out,
        "- Signalisations à conserver    : {} ({:.1}%)",
        s.conserved, s.conserved_pct
    )?;
    writeln!(
        out,
        "- Signalisations à supprimer    : {} ({:.1}%)",
        s.to_delete, s.to_delete_pct
    )?;
    writeln!(out, "- Groupes de doublons identifiés : {}", s.duplicate_groups)?;

    writeln!(out, "\nRÉPARTITION PAR TYPE D'IDPP")?;
    for class in input.classes() {
        let treatment = if class.excluded { "exclus" } else { "analysés" };
        writeln!(
            out,
            "- {} : {} ({:.1}%), {treatment}",
            class.prefix, class.count, class.pct
        )?;
    }

    writeln!(out, "\nRÈGLES APPLIQUÉES (hors {prefix})")?;
    for (rule, groups, records) in input.rules() {
        let share = pct(records, s.eligible);
        let label = rule_label(rule);
        if rule == Rule::Unique {
            writeln!(out, "- {label} : {records} signalisations ({share:.1}%)")?;
        } else {
            writeln!(out, "- {label} : {groups} groupes, {records} signalisations ({share:.1}%)")?;
        }
    }

    writeln!(out, "\nANOMALIES DE SAISIE")?;
    for (label, count) in input.anomalies() {
        writeln!(out, "- {label} : {count}")?;
    }

    writeln!(out, "\nFICHIERS GÉNÉRÉS")?;
    for file in input.files {
        match file.records {
            Some(n) => writeln!(out, "- {} ({n} signalisations)", file_name(file))?,
            None => writeln!(out, "- {}", file_name(file))?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::NaiveDate;
    use faed_dedup::loader::parse_rows;
    use faed_dedup::{run, DedupConfig, DedupResult};

    use crate::export::ReportKind;

    const INPUT: &str = "\
NUMERO_SIGNALISATION;NUMERO_PERSONNE;IDENTIFIANT_GASPARD;NOM;PRENOM;DATE_NAISSANCE_MIN;DATE_CREATION_FAED;NUM_PROCEDURE;NUMERO_CLICHE
12345;67890;GN123456789;DUPONT;Jean;01/01/1980;15/03/2024;00116/00149/2024;
67890;67890;GN123456789;DUPONT;Jean;01/01/1980;20/03/2024;00116/00150/2024;CL4521
54321;11111;PN987654321;MARTIN;Paul;05/06/1975;01/02/2024;00200/00010/2024;
99999;22222;GN555666777;DURAND;Marie;12/12/1990;;00300/00020/2024;CL0099
";

    fn result() -> DedupResult {
        run(&DedupConfig::default(), parse_rows(INPUT, b';').unwrap()).unwrap()
    }

    fn files() -> Vec<ExportedFile> {
        vec![ExportedFile {
            kind: ReportKind::DeletionList,
            path: PathBuf::from(
                "/tmp/x/LISTE_Numeros_Signalisations_A_Supprimer_20240312_0930.csv",
            ),
            records: Some(1),
        }]
    }

    fn render(f: fn(&SummaryInput<'_>) -> String, name: &str) -> String {
        let result = result();
        let files = files();
        f(&SummaryInput {
            stats: &result.stats,
            meta: &result.meta,
            run_at: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap().and_hms_opt(9, 30, 0).unwrap(),
            input_name: name,
            fingerprint: Some("sha256:abc"),
            files: &files,
        })
    }

    #[test]
    fn escape_html_special_chars() {
        assert_eq!(
            escape_html("<a href=\"x\">l'&</a>"),
            "&lt;a href=&quot;x&quot;&gt;l&#39;&amp;&lt;/a&gt;"
        );
    }

    #[test]
    fn html_summary_contents() {
        let html = render(render_html, "extraction<1>.csv");
        assert!(html.contains("extraction&lt;1&gt;.csv"));
        assert!(!html.contains("extraction<1>"));
        assert!(html.contains("<td>66.7%</td>"));
        assert!(html.contains("<td>33.3%</td>"));
        assert!(html.contains("les 1 signalisations"));
        assert!(html.contains("<td>PN</td><td>1</td><td>25.0%</td><td>Exclus automatiquement</td>"));
        assert!(html.contains("<td>GN</td><td>3</td><td>75.0%</td><td>Analysés pour doublons</td>"));
        assert!(html.contains("Tri 1 - Signalisation de création"));
        assert!(html.contains("<td>Dates de création absentes</td><td>1</td>"));
        assert!(html.contains("LISTE_Numeros_Signalisations_A_Supprimer_20240312_0930.csv"));
        assert!(html.contains("sha256:abc"));
    }

    #[test]
    fn text_summary_contents() {
        let text = render(render_text, "extraction.csv");
        assert!(text.contains("Fichier traité     : extraction.csv"));
        assert!(text.contains("Signalisations à conserver    : 2 (66.7%)"));
        assert!(text.contains("Signalisations à supprimer    : 1 (33.3%)"));
        assert!(text.contains("- PN : 1 (25.0%), exclus"));
        assert!(text.contains("- Tri 1 - Signalisation de création : 1 groupes, 2 signalisations (66.7%)"));
        assert!(text.contains("- Signalisation unique : 1 signalisations (33.3%)"));
        assert!(!text.contains("Tri 2"));
        assert!(text.contains("(1 signalisations)"));
    }
}
