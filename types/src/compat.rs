//! The read-compatibility predicate between two type trees.

use crate::{AvroType, Resolved, Schema, ty::accepts_name};

/// Whether data written as `writer` (in `writer_schema`) can be read as
/// `reader` (in `reader_schema`).
///
/// Named types are compared by name only, so the check terminates on
/// recursive schemas; field-level compatibility of records is left to the
/// resolving compiler.
pub fn is_readable_by(
    writer_schema: &Schema,
    writer: &AvroType,
    reader_schema: &Schema,
    reader: &AvroType,
) -> bool {
    let (Some(w), Some(r)) = (writer_schema.resolve(writer), reader_schema.resolve(reader)) else {
        return false;
    };

    match (w, r) {
        (Resolved::Union(branches), _) => branches
            .iter()
            .any(|branch| is_readable_by(writer_schema, branch, reader_schema, reader)),
        (_, Resolved::Union(branches)) => branches
            .iter()
            .any(|branch| is_readable_by(writer_schema, writer, reader_schema, branch)),
        (Resolved::Primitive(w), Resolved::Primitive(r)) => w.promotes_to(r),
        (Resolved::Array(w), Resolved::Array(r)) | (Resolved::Map(w), Resolved::Map(r)) => {
            is_readable_by(writer_schema, w, reader_schema, r)
        }
        (Resolved::Record(w), Resolved::Record(r)) => accepts_name(&r.name, &r.aliases, &w.name),
        (Resolved::Enum(w), Resolved::Enum(r)) => accepts_name(&r.name, &r.aliases, &w.name),
        (Resolved::Fixed(w), Resolved::Fixed(r)) => {
            w.size == r.size && accepts_name(&r.name, &r.aliases, &w.name)
        }
        _ => false,
    }
}

/// Whether `writer` and `reader` denote the same type without any promotion.
pub fn is_exact_match(
    writer_schema: &Schema,
    writer: &AvroType,
    reader_schema: &Schema,
    reader: &AvroType,
) -> bool {
    match (writer, reader) {
        (AvroType::Primitive(w), AvroType::Primitive(r)) => w == r,
        (AvroType::Reference(w), AvroType::Reference(r)) => {
            match (writer_schema.definition(w), reader_schema.definition(r)) {
                (Some(wd), Some(rd)) => wd.kind_name() == rd.kind_name() && rd.accepts_name(w),
                _ => false,
            }
        }
        (AvroType::Array(w), AvroType::Array(r)) | (AvroType::Map(w), AvroType::Map(r)) => {
            is_exact_match(writer_schema, w, reader_schema, r)
        }
        _ => false,
    }
}

#[cfg(test)]
#[path = "compat_test.rs"]
mod compat_test;
