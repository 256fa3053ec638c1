//! Record and file fixtures

use avaluos_core::{Avaluo, AvaluoId, UploadFile};

/// In-progress record with the given identifiers
pub fn avaluo(id: AvaluoId, folio_shit: Option<&str>, folio: Option<&str>) -> Avaluo {
    let mut avaluo = Avaluo::new(id);
    avaluo.folio_shit = folio_shit.map(str::to_string);
    avaluo.folio = folio.map(str::to_string);
    avaluo.address = Some(format!("Calle {} #{}", folio_shit.unwrap_or("Sin folio"), id));
    avaluo
}

/// PDF upload of `size` bytes
pub fn pdf(file_name: &str, size: usize) -> UploadFile {
    UploadFile::new(file_name, "application/pdf", vec![0x25; size])
}
