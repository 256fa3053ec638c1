use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Record identifier (`avaluos.id`)
pub type AvaluoId = i64;

/// Authenticated user identifier (`user_roles.user_id`)
pub type UserId = Uuid;

/// Appraiser ("perito") identifier associated with a user account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppraiserId(pub String);

impl AppraiserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AppraiserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<String> for AppraiserId {
    fn from(value: String) -> Self {
        AppraiserId(value)
    }
}

impl From<&str> for AppraiserId {
    fn from(value: &str) -> Self {
        AppraiserId(value.to_string())
    }
}

/// Document columns of an avalúo that may hold a stored-object reference.
///
/// The string form is the column name; it is also the slot part of every
/// stored object name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSlot {
    Escritura,
    Rpp,
    NumOficial,
    Predial,
    Agua,
    Luz,
    PruebaEdad,
    IneComp,
    RfcComp,
    IneVend,
    RfcVend,
    Solicitud,
    Plano,
}

impl DocumentSlot {
    /// All slots in grid order
    pub const ALL: [DocumentSlot; 13] = [
        DocumentSlot::Escritura,
        DocumentSlot::Rpp,
        DocumentSlot::NumOficial,
        DocumentSlot::Predial,
        DocumentSlot::Agua,
        DocumentSlot::Luz,
        DocumentSlot::PruebaEdad,
        DocumentSlot::IneComp,
        DocumentSlot::RfcComp,
        DocumentSlot::IneVend,
        DocumentSlot::RfcVend,
        DocumentSlot::Solicitud,
        DocumentSlot::Plano,
    ];

    /// Column name in the records table
    pub fn column(&self) -> &'static str {
        match self {
            DocumentSlot::Escritura => "escritura",
            DocumentSlot::Rpp => "rpp",
            DocumentSlot::NumOficial => "num_oficial",
            DocumentSlot::Predial => "predial",
            DocumentSlot::Agua => "agua",
            DocumentSlot::Luz => "luz",
            DocumentSlot::PruebaEdad => "prueba_edad",
            DocumentSlot::IneComp => "ine_comp",
            DocumentSlot::RfcComp => "rfc_comp",
            DocumentSlot::IneVend => "ine_vend",
            DocumentSlot::RfcVend => "rfc_vend",
            DocumentSlot::Solicitud => "solicitud",
            DocumentSlot::Plano => "plano",
        }
    }

    /// Grid header
    pub fn label(&self) -> &'static str {
        match self {
            DocumentSlot::Escritura => "Escritura",
            DocumentSlot::Rpp => "RPP",
            DocumentSlot::NumOficial => "Núm. Oficial",
            DocumentSlot::Predial => "Predial",
            DocumentSlot::Agua => "Agua",
            DocumentSlot::Luz => "Luz",
            DocumentSlot::PruebaEdad => "Prueba Edad",
            DocumentSlot::IneComp => "INE Comp",
            DocumentSlot::RfcComp => "RFC Comp",
            DocumentSlot::IneVend => "INE Vend",
            DocumentSlot::RfcVend => "RFC Vend",
            DocumentSlot::Solicitud => "Solicitud",
            DocumentSlot::Plano => "Plano",
        }
    }
}

impl Display for DocumentSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.column())
    }
}

impl FromStr for DocumentSlot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        DocumentSlot::ALL
            .into_iter()
            .find(|slot| slot.column() == normalized)
            .ok_or_else(|| anyhow::anyhow!("Unknown document slot: {}", s))
    }
}

/// A column of the tracker grid.
///
/// Only document columns open an upload session when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridColumn {
    Direccion,
    FolioShit,
    Nss,
    Document(DocumentSlot),
}

impl GridColumn {
    pub fn document_slot(&self) -> Option<DocumentSlot> {
        match self {
            GridColumn::Document(slot) => Some(*slot),
            _ => None,
        }
    }
}

impl FromStr for GridColumn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direccion" => Ok(GridColumn::Direccion),
            "folio_shit" => Ok(GridColumn::FolioShit),
            "nss" => Ok(GridColumn::Nss),
            other => other.parse().map(GridColumn::Document),
        }
    }
}

/// Stored-object references of one avalúo, one field per [`DocumentSlot`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DocumentSet {
    pub escritura: Option<String>,
    pub rpp: Option<String>,
    pub num_oficial: Option<String>,
    pub predial: Option<String>,
    pub agua: Option<String>,
    pub luz: Option<String>,
    pub prueba_edad: Option<String>,
    pub ine_comp: Option<String>,
    pub rfc_comp: Option<String>,
    pub ine_vend: Option<String>,
    pub rfc_vend: Option<String>,
    pub solicitud: Option<String>,
    pub plano: Option<String>,
}

impl DocumentSet {
    fn field(&self, slot: DocumentSlot) -> &Option<String> {
        match slot {
            DocumentSlot::Escritura => &self.escritura,
            DocumentSlot::Rpp => &self.rpp,
            DocumentSlot::NumOficial => &self.num_oficial,
            DocumentSlot::Predial => &self.predial,
            DocumentSlot::Agua => &self.agua,
            DocumentSlot::Luz => &self.luz,
            DocumentSlot::PruebaEdad => &self.prueba_edad,
            DocumentSlot::IneComp => &self.ine_comp,
            DocumentSlot::RfcComp => &self.rfc_comp,
            DocumentSlot::IneVend => &self.ine_vend,
            DocumentSlot::RfcVend => &self.rfc_vend,
            DocumentSlot::Solicitud => &self.solicitud,
            DocumentSlot::Plano => &self.plano,
        }
    }

    fn field_mut(&mut self, slot: DocumentSlot) -> &mut Option<String> {
        match slot {
            DocumentSlot::Escritura => &mut self.escritura,
            DocumentSlot::Rpp => &mut self.rpp,
            DocumentSlot::NumOficial => &mut self.num_oficial,
            DocumentSlot::Predial => &mut self.predial,
            DocumentSlot::Agua => &mut self.agua,
            DocumentSlot::Luz => &mut self.luz,
            DocumentSlot::PruebaEdad => &mut self.prueba_edad,
            DocumentSlot::IneComp => &mut self.ine_comp,
            DocumentSlot::RfcComp => &mut self.rfc_comp,
            DocumentSlot::IneVend => &mut self.ine_vend,
            DocumentSlot::RfcVend => &mut self.rfc_vend,
            DocumentSlot::Solicitud => &mut self.solicitud,
            DocumentSlot::Plano => &mut self.plano,
        }
    }

    /// Stored reference for a slot; empty strings count as absent
    pub fn get(&self, slot: DocumentSlot) -> Option<&str> {
        self.field(slot).as_deref().filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, slot: DocumentSlot, reference: Option<String>) {
        *self.field_mut(slot) = reference;
    }

    /// Slots with a stored reference, in grid order
    pub fn present(&self) -> impl Iterator<Item = (DocumentSlot, &str)> + '_ {
        DocumentSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|r| (slot, r)))
    }
}

/// Appraisal case record (`avaluos` row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Avaluo {
    pub id: AvaluoId,
    #[serde(rename = "direccion")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "direccion"))]
    pub address: Option<String>,
    pub folio_shit: Option<String>,
    pub folio: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub documents: DocumentSet,
    pub nss: Option<bool>,
    #[serde(rename = "cerrado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cerrado"))]
    pub closed: bool,
    #[serde(rename = "cancelado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelado"))]
    pub cancelled: bool,
    #[serde(rename = "enviado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "enviado"))]
    pub sent_at: Option<DateTime<Utc>>,
}

impl Avaluo {
    /// Empty in-progress record, mostly useful for fixtures
    pub fn new(id: AvaluoId) -> Self {
        Self {
            id,
            address: None,
            folio_shit: None,
            folio: None,
            documents: DocumentSet::default(),
            nss: None,
            closed: false,
            cancelled: false,
            sent_at: None,
        }
    }

    pub fn document(&self, slot: DocumentSlot) -> Option<&str> {
        self.documents.get(slot)
    }

    pub fn is_sent(&self) -> bool {
        self.sent_at.is_some()
    }

    /// `folio_shit` when present and non-empty
    pub fn folio_shit(&self) -> Option<&str> {
        self.folio_shit.as_deref().filter(|s| !s.is_empty())
    }
}
