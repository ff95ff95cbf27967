use std::io::{BufRead, BufReader, Read};
use std::rc::Rc;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    headers: Rc<[String]>,
    values: Vec<String>,
}

impl RawRow {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == name)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

/// Lazily yields the data rows of a statement, skipping rows where every field
/// is blank. Short rows come through with the missing fields absent; read
/// failures surface as `Error::Parse`.
pub struct StatementRows<R: Read> {
    headers: Rc<[String]>,
    records: csv::ByteRecordsIntoIter<BufReader<R>>,
}

impl<R: Read> Iterator for StatementRows<R> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };
            let values: Vec<String> = record.iter().map(decode).collect();
            if values.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            return Some(Ok(RawRow {
                headers: Rc::clone(&self.headers),
                values,
            }));
        }
    }
}

/// With `delimiter == None` the delimiter is detected from the header line.
pub fn parse_statement<R: Read>(reader: R, delimiter: Option<u8>) -> Result<StatementRows<R>> {
    let mut buffered = BufReader::new(reader);
    let delimiter = match delimiter {
        Some(d) => d,
        None => detect_delimiter(&first_line(buffered.fill_buf()?)),
    };
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(buffered);
    let headers: Rc<[String]> = rdr
        .byte_headers()?
        .iter()
        .map(|h| decode(h).trim().to_string())
        .collect();
    Ok(StatementRows {
        headers,
        records: rdr.into_byte_records(),
    })
}

// Latin-1 exports come through with U+FFFD in place of the bad bytes.
fn decode(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

fn first_line(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == b'\n').unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).to_string()
}

// Most frequent candidate in the header line wins; comma on no hits.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let counts = [
        (b',', header_line.matches(',').count()),
        (b';', header_line.matches(';').count()),
        (b'\t', header_line.matches('\t').count()),
        (b'|', header_line.matches('|').count()),
    ];
    let mut best = (b',', 0);
    for (delim, count) in counts {
        if count > best.1 {
            best = (delim, count);
        }
    }
    best.0
}
