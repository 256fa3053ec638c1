//! Stored-object naming.
//!
//! Object names are derived, never random: `{base}_{slot}.{extension}` where
//! `base` is the record's `folio_shit`, or `{folio}_{appraiser}` when it has
//! none. Uploading to the same slot again therefore replaces the object.

use crate::error::AppError;
use crate::models::{AppraiserId, Avaluo, DocumentSlot};

/// Text after the last `.` of a file name; the whole name when it has no dot
pub fn file_extension(file_name: &str) -> &str {
    file_name.rsplit('.').next().unwrap_or(file_name)
}

/// Naming base of a record.
///
/// The appraiser is only consulted when the record has no `folio_shit`.
pub fn naming_base(avaluo: &Avaluo, appraiser: &AppraiserId) -> Result<String, AppError> {
    if let Some(folio_shit) = avaluo.folio_shit() {
        return Ok(folio_shit.to_string());
    }

    match avaluo.folio.as_deref().filter(|f| !f.is_empty()) {
        Some(folio) => Ok(format!("{}_{}", folio, appraiser)),
        None => Err(AppError::InvalidInput(format!(
            "Avalúo {} has neither folio_shit nor folio",
            avaluo.id
        ))),
    }
}

/// Object name for a document uploaded to `slot` of `avaluo`
pub fn object_name(
    avaluo: &Avaluo,
    appraiser: &AppraiserId,
    slot: DocumentSlot,
    file_name: &str,
) -> Result<String, AppError> {
    let base = naming_base(avaluo, appraiser)?;
    Ok(format!("{}_{}.{}", base, slot.column(), file_extension(file_name)))
}

/// Bare object name of a stored reference (a path or a previously signed URL).
///
/// Returns the last path segment with any query string or fragment removed and
/// percent-escapes decoded. `None` for absent or empty references.
pub fn object_name_from_reference(reference: &str) -> Option<String> {
    let without_fragment = reference.split('#').next().unwrap_or(reference);
    let path = without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment);
    let segment = path.rsplit('/').next().unwrap_or(path).trim();

    if segment.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avaluo(folio_shit: Option<&str>, folio: Option<&str>) -> Avaluo {
        let mut a = Avaluo::new(1);
        a.folio_shit = folio_shit.map(String::from);
        a.folio = folio.map(String::from);
        a
    }

    #[test]
    fn test_name_uses_folio_shit() {
        let a = avaluo(Some("ABC123"), Some("F1"));
        let name = object_name(&a, &"P7".into(), DocumentSlot::Predial, "doc.pdf").unwrap();
        assert_eq!(name, "ABC123_predial.pdf");
    }

    #[test]
    fn test_name_falls_back_to_folio_and_appraiser() {
        let a = avaluo(None, Some("F99"));
        let name = object_name(&a, &"P7".into(), DocumentSlot::Luz, "photo.jpg").unwrap();
        assert_eq!(name, "F99_P7_luz.jpg");
    }

    #[test]
    fn test_empty_folio_shit_counts_as_absent() {
        let a = avaluo(Some(""), Some("F99"));
        let name = object_name(&a, &"P7".into(), DocumentSlot::Agua, "recibo.png").unwrap();
        assert_eq!(name, "F99_P7_agua.png");
    }

    #[test]
    fn test_name_requires_some_folio() {
        let a = avaluo(None, None);
        let err = object_name(&a, &"P7".into(), DocumentSlot::Agua, "recibo.png").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("doc.pdf"), "pdf");
        assert_eq!(file_extension("scan.final.JPEG"), "JPEG");
        assert_eq!(file_extension("sin_extension"), "sin_extension");
    }

    #[test]
    fn test_object_name_from_reference() {
        assert_eq!(
            object_name_from_reference("ABC123_predial.pdf").as_deref(),
            Some("ABC123_predial.pdf")
        );
        assert_eq!(
            object_name_from_reference(
                "https://x.supabase.co/storage/v1/object/sign/documentos-avaluos/ABC123_predial.pdf?token=abc#page=2"
            )
            .as_deref(),
            Some("ABC123_predial.pdf")
        );
        assert_eq!(
            object_name_from_reference("https://h/b/F%2099_P7_luz.jpg").as_deref(),
            Some("F 99_P7_luz.jpg")
        );
        assert_eq!(object_name_from_reference(""), None);
        assert_eq!(object_name_from_reference("https://h/b/"), None);
    }
}
