//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde_json::json;
use tokio::net::TcpListener;

use sheet_gateway::config::GatewayConfig;
use sheet_gateway::http::GatewayServer;
use sheet_gateway::interception::DocumentNormalizer;
use sheet_gateway::multipart::{decode_bytes, encode, parse_boundary, DecodeLimits, FormData};
use sheet_gateway::normalizer::NormalizerServer;

/// A request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decode the captured multipart body.
    pub async fn form(&self) -> FormData {
        let boundary = parse_boundary(self.header("content-type").unwrap()).unwrap();
        decode_bytes(self.body.clone(), &boundary, DecodeLimits::default())
            .await
            .unwrap()
    }
}

/// Requests recorded by a capturing upstream.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<CapturedRequest>>>);

impl Captured {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a backend that records every request and answers 200 with JSON.
pub async fn start_capturing_backend() -> (SocketAddr, Captured) {
    let captured = Captured::default();
    let store = captured.clone();

    let app = Router::new().fallback(move |request: Request<Body>| {
        let store = store.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            let received = body.len();
            store.0.lock().unwrap().push(CapturedRequest {
                method: parts.method,
                uri: parts.uri.to_string(),
                headers: parts.headers,
                body,
            });
            (
                StatusCode::OK,
                [("x-backend", "captured")],
                Json(json!({ "code": 0, "received": received })),
            )
        }
    });

    (serve(app).await, captured)
}

/// Start a backend that always answers with the given status and body.
pub async fn start_static_backend(status: StatusCode, body: &'static str) -> SocketAddr {
    let app = Router::new().fallback(move || async move { (status, body).into_response() });
    serve(app).await
}

/// Start a normalizer that sleeps before answering.
pub async fn start_slow_normalizer(delay: Duration) -> SocketAddr {
    let app = Router::new().route(
        "/process",
        post(move || async move {
            tokio::time::sleep(delay).await;
            Json(json!({ "combined": "<html>late</html>" }))
        }),
    );
    serve(app).await
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Gateway configuration pointing at local upstreams.
pub fn gateway_config(backend: SocketAddr, normalizer: Option<SocketAddr>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.backend_url = Some(format!("http://{}", backend));
    config.upstream.normalizer_url = normalizer.map(|addr| format!("http://{}", addr));
    config.timeouts.connect_secs = 2;
    config.timeouts.normalizer_secs = 30;
    config.timeouts.backend_secs = 30;
    config
}

/// Start the gateway with its normal remote normalizer.
pub async fn start_gateway(config: GatewayConfig) -> SocketAddr {
    let server = GatewayServer::new(&config).unwrap();
    serve(server.router()).await
}

/// Start the gateway with an in-process normalizer.
pub async fn start_gateway_with(config: GatewayConfig, normalizer: Arc<dyn DocumentNormalizer>) -> SocketAddr {
    let server = GatewayServer::with_normalizer(&config, Some(normalizer)).unwrap();
    serve(server.router()).await
}

/// Start the real normalizer service.
pub async fn start_normalizer(config: GatewayConfig) -> SocketAddr {
    serve(NormalizerServer::new(&config).router()).await
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// POST a form encoded by the crate's own encoder, so filenames are sent
/// byte for byte.
pub async fn post_form(url: &str, form: &FormData, headers: &[(&str, &str)]) -> reqwest::Response {
    let encoded = encode(form);
    let mut request = client()
        .post(url)
        .header("content-type", encoded.content_type());
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    request.body(encoded.into_body()).send().await.unwrap()
}

/// Marks a cell as a date serial rendered with a date number format,
/// e.g. `date:45306` for 2024-01-15.
pub const DATE_CELL: &str = "date:";

/// Worksheet contents for [`build_xlsx`].
pub struct SheetFixture {
    pub name: &'static str,
    /// Cell values; numbers become numeric cells, [`DATE_CELL`] values become
    /// date-styled cells, everything else is an inline string.
    pub rows: Vec<Vec<&'static str>>,
    /// Ranges such as `A1:A2`.
    pub merges: Vec<&'static str>,
}

fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn sheet_xml(sheet: &SheetFixture) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in sheet.rows.iter().enumerate() {
        xml.push_str(&format!("<row r=\"{}\">", r + 1));
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let cell_ref = format!("{}{}", column_letters(c), r + 1);
            if let Some(serial) = value.strip_prefix(DATE_CELL) {
                xml.push_str(&format!("<c r=\"{}\" s=\"1\"><v>{}</v></c>", cell_ref, serial));
            } else if value.parse::<f64>().is_ok() {
                xml.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", cell_ref, value));
            } else {
                xml.push_str(&format!(
                    "<c r=\"{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                    cell_ref,
                    xml_escape(value)
                ));
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");
    if !sheet.merges.is_empty() {
        xml.push_str(&format!("<mergeCells count=\"{}\">", sheet.merges.len()));
        for range in &sheet.merges {
            xml.push_str(&format!("<mergeCell ref=\"{}\"/>", range));
        }
        xml.push_str("</mergeCells>");
    }
    xml.push_str("</worksheet>");
    xml
}

/// Build a minimal `.xlsx` workbook in memory.
pub fn build_xlsx(sheets: &[SheetFixture]) -> Vec<u8> {
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let mut overrides = String::new();
    let mut workbook_sheets = String::new();
    let mut relationships = String::new();
    for (i, sheet) in sheets.iter().enumerate() {
        let n = i + 1;
        overrides.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            n
        ));
        workbook_sheets.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            xml_escape(sheet.name),
            n,
            n
        ));
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            n, n
        ));
    }
    relationships.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheets.len() + 1
    ));

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
{}
</Types>"#,
            overrides
        )
        .as_bytes(),
    )
    .unwrap();

    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#,
    )
    .unwrap();

    zip.start_file("xl/workbook.xml", options).unwrap();
    zip.write_all(
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>{}</sheets>
</workbook>"#,
            workbook_sheets
        )
        .as_bytes(),
    )
    .unwrap();

    zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
    zip.write_all(
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
{}
</Relationships>"#,
            relationships
        )
        .as_bytes(),
    )
    .unwrap();

    // Style 1 uses the built-in short date format (id 14).
    zip.start_file("xl/styles.xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs>
</styleSheet>"#,
    )
    .unwrap();

    for (i, sheet) in sheets.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
            .unwrap();
        zip.write_all(sheet_xml(sheet).as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    buffer
}

/// Two-row merged header (`Region` spanning both rows, `Sales` spanning
/// `Q1`/`Q2`) followed by one data row.
pub fn merged_header_sheet() -> SheetFixture {
    SheetFixture {
        name: "Sales",
        rows: vec![vec!["Region", "Sales", ""], vec!["", "Q1", "Q2"], vec!["North", "10", "20"]],
        merges: vec!["A1:A2", "B1:C1"],
    }
}

pub fn merged_header_xlsx() -> Vec<u8> {
    build_xlsx(&[merged_header_sheet()])
}
