use crate::error::{DocsiftError, Result};

/// Plain-text reader for Office Open XML word documents.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn extract(bytes: &[u8]) -> Result<String> {
        let docx =
            docx_rs::read_docx(bytes).map_err(|e| DocsiftError::decode("DOCX", e.to_string()))?;

        let mut blocks: Vec<String> = Vec::new();

        for child in &docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(paragraph) => {
                    let text = Self::paragraph_text(paragraph);
                    if !text.trim().is_empty() {
                        blocks.push(text);
                    }
                }
                docx_rs::DocumentChild::Table(table) => {
                    let text = Self::table_text(table);
                    if !text.is_empty() {
                        blocks.push(text);
                    }
                }
                _ => {}
            }
        }

        Ok(blocks.join("\n"))
    }

    fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
        let mut content = String::new();
        for para_child in &paragraph.children {
            if let docx_rs::ParagraphChild::Run(run) = para_child {
                for run_child in &run.children {
                    match run_child {
                        docx_rs::RunChild::Text(text) => content.push_str(&text.text),
                        docx_rs::RunChild::Tab(_) => content.push('\t'),
                        _ => {}
                    }
                }
            }
        }
        content
    }

    /// One line per row, cells separated by tabs.
    fn table_text(table: &docx_rs::Table) -> String {
        let mut lines = Vec::new();

        for table_child in &table.rows {
            let docx_rs::TableChild::TableRow(row) = table_child;
            let cells: Vec<String> = row
                .cells
                .iter()
                .map(|row_child| {
                    let docx_rs::TableRowChild::TableCell(cell) = row_child;
                    cell.children
                        .iter()
                        .filter_map(|content| match content {
                            docx_rs::TableCellContent::Paragraph(p) => {
                                Some(Self::paragraph_text(p))
                            }
                            _ => None,
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                        .trim()
                        .to_string()
                })
                .collect();

            if cells.iter().any(|c| !c.is_empty()) {
                lines.push(cells.join("\t"));
            }
        }

        lines.join("\n")
    }
}
