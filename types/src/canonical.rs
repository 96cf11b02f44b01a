//! Parsing Canonical Form and the CRC-64-AVRO fingerprint.

use core::fmt::Write;

use hashbrown::HashSet;

use crate::{AvroType, Definition, QualifiedName, Schema};

const EMPTY: u64 = 0xc15d_213a_a4d7_a795;

impl Schema {
    /// The schema with everything irrelevant to reading stripped: no docs,
    /// aliases, defaults or whitespace, full names everywhere, attributes in
    /// a fixed order. Equal canonical forms decode identically.
    pub fn canonical_form(&self) -> String {
        let mut out = String::new();
        let mut seen = HashSet::new();
        write_canonical(self, self.root(), &mut seen, &mut out);
        out
    }

    /// 64-bit Rabin fingerprint of the canonical form.
    pub fn fingerprint(&self) -> u64 {
        fingerprint64(self.canonical_form().as_bytes())
    }
}

pub fn fingerprint64(bytes: &[u8]) -> u64 {
    let table = fingerprint_table();
    bytes.iter().fold(EMPTY, |fp, &b| {
        (fp >> 8) ^ table[((fp ^ b as u64) & 0xff) as usize]
    })
}

fn fingerprint_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let mut fp = i as u64;
        for _ in 0..8 {
            fp = (fp >> 1) ^ (EMPTY & (fp & 1).wrapping_neg());
        }
        *slot = fp;
    }
    table
}

fn quoted(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn write_canonical(
    schema: &Schema,
    ty: &AvroType,
    seen: &mut HashSet<QualifiedName>,
    out: &mut String,
) {
    match ty {
        AvroType::Primitive(p) => out.push_str(&quoted(p.name())),
        AvroType::Array(items) => {
            out.push_str(r#"{"type":"array","items":"#);
            write_canonical(schema, items, seen, out);
            out.push('}');
        }
        AvroType::Map(values) => {
            out.push_str(r#"{"type":"map","values":"#);
            write_canonical(schema, values, seen, out);
            out.push('}');
        }
        AvroType::Union(branches) => {
            out.push('[');
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(schema, branch, seen, out);
            }
            out.push(']');
        }
        AvroType::Reference(name) => {
            let full_name = quoted(&name.to_string());
            if !seen.insert(name.clone()) {
                out.push_str(&full_name);
                return;
            }
            match schema.definition(name) {
                Some(Definition::Record(record)) => {
                    let _ = write!(out, r#"{{"name":{full_name},"type":"record","fields":["#);
                    for (i, field) in record.fields.iter().enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        let _ = write!(out, r#"{{"name":{},"type":"#, quoted(&field.name));
                        write_canonical(schema, &field.ty, seen, out);
                        out.push('}');
                    }
                    out.push_str("]}");
                }
                Some(Definition::Enum(e)) => {
                    let symbols: Vec<String> = e.symbols.iter().map(|s| quoted(s)).collect();
                    let _ = write!(
                        out,
                        r#"{{"name":{full_name},"type":"enum","symbols":[{}]}}"#,
                        symbols.join(",")
                    );
                }
                Some(Definition::Fixed(f)) => {
                    let _ = write!(
                        out,
                        r#"{{"name":{full_name},"type":"fixed","size":{}}}"#,
                        f.size
                    );
                }
                None => out.push_str(&full_name),
            }
        }
    }
}
