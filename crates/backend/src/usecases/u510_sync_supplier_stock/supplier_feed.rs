use crate::shared::marketplaces::FailureKind;
use calamine::Reader;
use contracts::usecases::u510_sync_supplier_stock::SupplierRecord;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// Сигнатура составного документа OLE: так начинается файл .xls
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to download supplier stock: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Supplier stock download failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to read supplier archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Supplier archive contains no .xls, .xlsx or .csv file")]
    NoStockEntry,

    #[error("Failed to read supplier file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read supplier workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Supplier workbook has no sheets")]
    EmptyWorkbook,

    #[error("Header row with column {0:?} not found in supplier stock")]
    HeaderNotFound(String),

    #[error("Column {0:?} not found in supplier stock header")]
    MissingColumn(String),
}

impl FeedError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FeedError::Download(e) if e.is_timeout() => FailureKind::Timeout,
            FeedError::Download(e) if e.is_connect() => FailureKind::Connection,
            FeedError::Status(_) => FailureKind::Status,
            _ => FailureKind::Other,
        }
    }
}

/// Разметка складского файла поставщика
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFormat {
    /// Разделитель полей, только для CSV
    pub delimiter: u8,
    /// Сколько первых строк просматривать в поисках заголовка
    pub header_scan_rows: usize,
    pub code_column: String,
    pub quantity_column: String,
    pub price_column: String,
}

impl Default for FeedFormat {
    fn default() -> Self {
        Self {
            delimiter: b';',
            header_scan_rows: 30,
            code_column: "Код".to_string(),
            quantity_column: "Количество".to_string(),
            price_column: "Цена".to_string(),
        }
    }
}

/// Вид таблицы с остатками
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockFileKind {
    /// .xls или .xlsx
    Workbook,
    Csv,
}

impl StockFileKind {
    fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.ends_with(".xls") || name.ends_with(".xlsx") {
            Some(StockFileKind::Workbook)
        } else if name.ends_with(".csv") {
            Some(StockFileKind::Csv)
        } else {
            None
        }
    }
}

/// Скачать складской файл поставщика и разобрать его
pub async fn download_stock(
    client: &reqwest::Client,
    url: &str,
    format: &FeedFormat,
) -> Result<Vec<SupplierRecord>, FeedError> {
    tracing::info!("Downloading supplier stock from {}", url);

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status(status));
    }
    let bytes = response.bytes().await?;
    tracing::info!("Downloaded {} bytes of supplier stock", bytes.len());

    read_stock_bytes(&bytes, format)
}

/// Прочитать складской файл с диска (.zip, .xls, .xlsx или .csv)
pub fn load_stock_file(path: &Path, format: &FeedFormat) -> Result<Vec<SupplierRecord>, FeedError> {
    tracing::info!("Reading supplier stock from {}", path.display());
    let bytes = std::fs::read(path).map_err(|source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_stock_bytes(&bytes, format)
}

/// Разобрать содержимое файла
///
/// Вид определяется по сигнатуре: zip-архив с таблицей внутри, сама книга
/// Excel (xls или xlsx) либо CSV.
pub fn read_stock_bytes(bytes: &[u8], format: &FeedFormat) -> Result<Vec<SupplierRecord>, FeedError> {
    if bytes.starts_with(CFB_MAGIC) {
        return parse_stock_workbook(bytes, format);
    }
    if !bytes.starts_with(ZIP_MAGIC) {
        return parse_stock_csv(bytes, format);
    }

    // xlsx тоже zip-архив
    let archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    if archive.index_for_name("xl/workbook.xml").is_some() {
        return parse_stock_workbook(bytes, format);
    }

    let (kind, data) = extract_stock_entry(bytes)?;
    match kind {
        StockFileKind::Workbook => parse_stock_workbook(&data, format),
        StockFileKind::Csv => parse_stock_csv(&data, format),
    }
}

/// Достать из архива первую таблицу с остатками, не распаковывая ее на диск
pub fn extract_stock_entry(archive_bytes: &[u8]) -> Result<(StockFileKind, Vec<u8>), FeedError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes))?;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let name = file.name().to_string();
        if file.is_dir() {
            continue;
        }
        let Some(kind) = StockFileKind::from_name(&name) else {
            continue;
        };
        tracing::debug!("Using archive entry {}", name);
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data).map_err(|source| FeedError::Io {
            path: PathBuf::from(name),
            source,
        })?;
        return Ok((kind, data));
    }

    Err(FeedError::NoStockEntry)
}

/// Разобрать первый лист книги Excel
pub fn parse_stock_workbook(
    data: &[u8],
    format: &FeedFormat,
) -> Result<Vec<SupplierRecord>, FeedError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(FeedError::EmptyWorkbook)??;

    let rows = range
        .rows()
        .map(|row| Ok::<_, FeedError>(row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>()));
    collect_records(rows, format)
}

/// Разобрать CSV поставщика
pub fn parse_stock_csv(data: &[u8], format: &FeedFormat) -> Result<Vec<SupplierRecord>, FeedError> {
    let text = String::from_utf8_lossy(data);
    // Strip UTF-8 BOM if present
    let text = text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(format.delimiter)
        .from_reader(text.as_bytes());
    let rows = reader
        .records()
        .map(|result| result.map(|row| row.iter().map(str::to_string).collect::<Vec<_>>()));
    collect_records(rows, format)
}

/// Строки таблицы в список товаров
///
/// Перед таблицей в файле идет шапка документа, поэтому строка заголовка
/// ищется по имени колонки с кодом товара. Строки без кода пропускаются.
fn collect_records<I, E>(mut rows: I, format: &FeedFormat) -> Result<Vec<SupplierRecord>, FeedError>
where
    I: Iterator<Item = Result<Vec<String>, E>>,
    E: std::fmt::Display,
{
    let header = rows
        .by_ref()
        .take(format.header_scan_rows)
        .filter_map(Result::ok)
        .find(|row| column_index(row, &format.code_column).is_some())
        .ok_or_else(|| FeedError::HeaderNotFound(format.code_column.clone()))?;

    let find = |name: &str| {
        column_index(&header, name).ok_or_else(|| FeedError::MissingColumn(name.to_string()))
    };
    let code_idx = find(&format.code_column)?;
    let quantity_idx = find(&format.quantity_column)?;
    let price_idx = find(&format.price_column)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for result in rows {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Skipping malformed supplier row: {}", e);
                skipped += 1;
                continue;
            }
        };

        let field = |i: usize| row.get(i).map(|v| v.trim()).unwrap_or_default().to_string();
        let code = field(code_idx);
        if code.is_empty() {
            skipped += 1;
            continue;
        }
        records.push(SupplierRecord {
            code,
            quantity: field(quantity_idx),
            price: field(price_idx),
        });
    }

    tracing::info!(
        "Supplier stock parsed: {} records, {} rows skipped",
        records.len(),
        skipped
    );
    Ok(records)
}

fn column_index(row: &[String], name: &str) -> Option<usize> {
    let name = name.trim().to_lowercase();
    row.iter().position(|h| h.trim().to_lowercase() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_CSV: &str = "\u{FEFF}Остатки товаров на складе;;;\n\
        Дата: 01.02.2024;;;\n\
        ;;;\n\
        Наименование;Код;Количество;Цена\n\
        Casio G-Shock;GA-2100-1A;>10;11'990.00 руб.\n\
        Casio Edifice;EFR-526L-1A;1;8'490.00 руб.\n\
        ;;;\n\
        Casio Vintage;A168WA-1;5;5'990.00 руб.\n";

    /// Строки складского файла в том виде, как их выгружает поставщик
    const SAMPLE_ROWS: &[&[&str]] = &[
        &["Остатки товаров на складе"],
        &["Дата: 01.02.2024"],
        &[],
        &["Наименование", "Код", "Количество", "Цена"],
        &["Casio G-Shock", "GA-2100-1A", ">10", "11'990.00 руб."],
        &["Casio Edifice", "EFR-526L-1A", "1", "8'490.00 руб."],
        &[],
        &["Casio Vintage", "A168WA-1", "5", "5'990.00 руб."],
    ];

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn xml_escape(value: &str) -> String {
        value
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    /// Минимальная книга Excel с одним листом; числа пишутся числовыми ячейками
    fn workbook_with(rows: &[&[&str]]) -> Vec<u8> {
        let mut sheet_data = String::new();
        for (r, row) in rows.iter().enumerate() {
            sheet_data.push_str(&format!("<row r=\"{}\">", r + 1));
            for (c, value) in row.iter().enumerate() {
                let cell_ref = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                if value.parse::<f64>().is_ok() {
                    sheet_data.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", cell_ref, value));
                } else {
                    sheet_data.push_str(&format!(
                        "<c r=\"{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                        cell_ref,
                        xml_escape(value)
                    ));
                }
            }
            sheet_data.push_str("</row>");
        }

        let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;
        let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;
        let workbook = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="TDSheet" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
        let workbook_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;
        let sheet = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
            sheet_data
        );

        zip_with(&[
            ("[Content_Types].xml", content_types.as_bytes()),
            ("_rels/.rels", root_rels.as_bytes()),
            ("xl/workbook.xml", workbook.as_bytes()),
            ("xl/_rels/workbook.xml.rels", workbook_rels.as_bytes()),
            ("xl/worksheets/sheet1.xml", sheet.as_bytes()),
        ])
    }

    fn sample_records() -> Vec<SupplierRecord> {
        vec![
            SupplierRecord::new("GA-2100-1A", ">10", "11'990.00 руб."),
            SupplierRecord::new("EFR-526L-1A", "1", "8'490.00 руб."),
            SupplierRecord::new("A168WA-1", "5", "5'990.00 руб."),
        ]
    }

    #[test]
    fn test_parse_skips_preamble_and_empty_codes() {
        let records = parse_stock_csv(SAMPLE_CSV.as_bytes(), &FeedFormat::default()).unwrap();

        assert_eq!(
            records,
            vec![
                SupplierRecord::new("GA-2100-1A", ">10", "11'990.00 руб."),
                SupplierRecord::new("EFR-526L-1A", "1", "8'490.00 руб."),
                SupplierRecord::new("A168WA-1", "5", "5'990.00 руб."),
            ]
        );
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let csv = "sku,qty,PRICE\nA,2,10.00\n";
        let format = FeedFormat {
            delimiter: b',',
            header_scan_rows: 5,
            code_column: "SKU".to_string(),
            quantity_column: "Qty".to_string(),
            price_column: "price".to_string(),
        };

        let records = parse_stock_csv(csv.as_bytes(), &format).unwrap();
        assert_eq!(records, vec![SupplierRecord::new("A", "2", "10.00")]);
    }

    #[test]
    fn test_missing_header_is_error() {
        let err = parse_stock_csv(b"a;b;c\n1;2;3\n", &FeedFormat::default()).unwrap_err();
        assert!(matches!(err, FeedError::HeaderNotFound(_)));
    }

    #[test]
    fn test_missing_price_column_is_error() {
        let err = parse_stock_csv("Код;Количество\nA;1\n".as_bytes(), &FeedFormat::default())
            .unwrap_err();
        match err {
            FeedError::MissingColumn(name) => assert_eq!(name, "Цена"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_zip_archive() {
        let archive = zip_with(&[
            ("readme.txt", b"ignore me".as_slice()),
            ("ostatki.csv", SAMPLE_CSV.as_bytes()),
        ]);

        let records = read_stock_bytes(&archive, &FeedFormat::default()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].code, "A168WA-1");
    }

    #[test]
    fn test_archive_without_csv() {
        let archive = zip_with(&[("ostatki.txt", b"binary".as_slice())]);
        let err = read_stock_bytes(&archive, &FeedFormat::default()).unwrap_err();
        assert!(matches!(err, FeedError::NoStockEntry));
    }

    #[test]
    fn test_read_zip_with_xls_entry() {
        let archive = zip_with(&[
            ("readme.txt", b"ignore me".as_slice()),
            ("ostatki.xls", workbook_with(SAMPLE_ROWS).as_slice()),
        ]);

        let records = read_stock_bytes(&archive, &FeedFormat::default()).unwrap();
        assert_eq!(records, sample_records());
    }

    #[test]
    fn test_read_plain_workbook() {
        let records =
            read_stock_bytes(&workbook_with(SAMPLE_ROWS), &FeedFormat::default()).unwrap();
        assert_eq!(records, sample_records());
    }

    #[test]
    fn test_workbook_without_price_column() {
        let rows: &[&[&str]] = &[&["Код", "Количество"], &["A", "2"]];
        let err = read_stock_bytes(&workbook_with(rows), &FeedFormat::default()).unwrap_err();
        assert!(matches!(err, FeedError::MissingColumn(name) if name == "Цена"));
    }

    #[test]
    fn test_broken_xls_entry() {
        let archive = zip_with(&[("ostatki.xls", b"not a workbook".as_slice())]);
        let err = read_stock_bytes(&archive, &FeedFormat::default()).unwrap_err();
        assert!(matches!(err, FeedError::Workbook(_)));
        assert_eq!(err.kind(), FailureKind::Other);
    }

    #[test]
    fn test_entry_kind_by_name() {
        assert_eq!(StockFileKind::from_name("OSTATKI.XLS"), Some(StockFileKind::Workbook));
        assert_eq!(StockFileKind::from_name("ostatki.xlsx"), Some(StockFileKind::Workbook));
        assert_eq!(StockFileKind::from_name("dir/ostatki.csv"), Some(StockFileKind::Csv));
        assert_eq!(StockFileKind::from_name("ostatki.pdf"), None);
    }

    #[test]
    fn test_load_stock_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ostatki.zip");
        std::fs::write(&path, zip_with(&[("OSTATKI.CSV", SAMPLE_CSV.as_bytes())])).unwrap();

        let records = load_stock_file(&path, &FeedFormat::default()).unwrap();
        assert_eq!(records.len(), 3);

        let err = load_stock_file(&dir.path().join("missing.csv"), &FeedFormat::default())
            .unwrap_err();
        assert!(matches!(err, FeedError::Io { .. }));
    }

    #[tokio::test]
    async fn test_download_stock() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/upload/files/ostatki.zip"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(zip_with(&[(
                    "ostatki.xls",
                    workbook_with(SAMPLE_ROWS).as_slice(),
                )])),
            )
            .mount(&server)
            .await;

        let url = format!("{}/upload/files/ostatki.zip", server.uri());
        let records = download_stock(&reqwest::Client::new(), &url, &FeedFormat::default())
            .await
            .unwrap();
        assert_eq!(records, sample_records());

        let missing = format!("{}/nope.zip", server.uri());
        let err = download_stock(&reqwest::Client::new(), &missing, &FeedFormat::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Status);
    }
}
