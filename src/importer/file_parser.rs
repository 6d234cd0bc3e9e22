// ==========================================
// 数据包导入工具 - 文件解析器
// ==========================================
// 职责: 将表格文件读为 表头 + 位置值 行
// 支持: CSV (.csv) / Excel (.xlsx/.xls，第一个工作表)
// 约束: 行长度不做修补，交由 Row::from_header 校验
// ==========================================

use crate::domain::row::Row;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// TabularFile - 表头 + 位置值
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularFile {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularFile {
    /// 组合为行记录
    pub fn into_rows(self) -> ImportResult<Vec<Row>> {
        Row::zip_all(&self.header, &self.rows)
    }
}

/// 文件解析接口
pub trait FileParser: Send + Sync {
    fn parse(&self, file_path: &Path) -> ImportResult<TabularFile>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn is_blank(values: &[String]) -> bool {
    values.iter().all(|v| v.trim().is_empty())
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse(&self, file_path: &Path) -> ImportResult<TabularFile> {
        ensure_exists(file_path)?;

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 行长度由 Row 校验
            .from_reader(file);

        let header: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let values: Vec<String> = record.iter().map(str::to_string).collect();

            // 跳过完全空白的行
            if is_blank(&values) {
                continue;
            }
            rows.push(values);
        }

        Ok(TabularFile { header, rows })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse(&self, file_path: &Path) -> ImportResult<TabularFile> {
        ensure_exists(file_path)?;

        let mut workbook: Xlsx<_> = open_workbook(file_path)?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let mut sheet_rows = range.rows();
        let header_row = sheet_rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无表头".to_string()))?;
        let header: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for data_row in sheet_rows {
            let values: Vec<String> = data_row.iter().map(|cell| cell.to_string()).collect();
            if is_blank(&values) {
                continue;
            }
            rows.push(values);
        }

        Ok(TabularFile { header, rows })
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse(&self, file_path: &Path) -> ImportResult<TabularFile> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse(file_path),
            "xlsx" | "xls" => ExcelParser.parse(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_csv_parser_header_and_rows() {
        let file = csv_file(&["sku,name", "A,Alpha", "B,\"Beta, Inc\""]);
        let table = UniversalFileParser.parse(file.path()).unwrap();

        assert_eq!(table.header, vec!["sku", "name"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][1], "Beta, Inc");
    }

    #[test]
    fn test_csv_parser_skip_blank_rows() {
        let file = csv_file(&["sku,name", "A,Alpha", ",", "B,Beta"]);
        let table = CsvParser.parse(file.path()).unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_short_row_reported_on_zip() {
        let file = csv_file(&["sku,name,price", "A,Alpha"]);
        let table = CsvParser.parse(file.path()).unwrap();
        let err = table.into_rows().unwrap_err();
        assert!(matches!(
            err,
            ImportError::RowLengthMismatch { row: 1, expected: 3, actual: 2 }
        ));
    }

    #[test]
    fn test_file_not_found_and_unsupported() {
        assert!(matches!(
            CsvParser.parse(Path::new("non_existent.csv")),
            Err(ImportError::FileNotFound(_))
        ));
        assert!(matches!(
            UniversalFileParser.parse(Path::new("pack.json")),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }
}
