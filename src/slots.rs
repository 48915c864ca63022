//! Document slots: the three named inputs a composition request needs.
//!
//! The registry rejects a candidate at **assignment time** when its declared
//! type is not `application/pdf`, so by the time a request is built the
//! slots can only hold PDFs. A rejected assignment never disturbs the slot's
//! previous contents; the user fixes the file and assigns again.

use crate::error::ShipMergeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The only document type the composition service accepts.
pub const PDF_MIME: &str = "application/pdf";

/// The three named input positions of a composition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Invoice,
    PackingSlip,
    ShippingLabel,
}

impl SlotName {
    /// All slots, in the order they appear in the multipart payload.
    pub const ALL: [SlotName; 3] = [
        SlotName::Invoice,
        SlotName::PackingSlip,
        SlotName::ShippingLabel,
    ];

    /// The multipart field name the service expects for this slot.
    pub fn field_name(&self) -> &'static str {
        match self {
            SlotName::Invoice => "invoice",
            SlotName::PackingSlip => "packing_slip",
            SlotName::ShippingLabel => "shipping_label",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlotName::Invoice => "invoice",
            SlotName::PackingSlip => "packing slip",
            SlotName::ShippingLabel => "shipping label",
        };
        write!(f, "{s}")
    }
}

/// One candidate document: raw bytes plus the metadata the wire needs.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    mime_type: String,
    file_name: String,
}

impl Document {
    /// Construct a document from in-memory bytes with a declared type.
    pub fn new(
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Read a document from disk, deriving its type from the `%PDF` magic
    /// bytes rather than the extension.
    ///
    /// A non-PDF file loads fine here but is rejected when assigned to a
    /// slot. Loading and validation are separate steps so callers can
    /// report which slot the bad file was destined for.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ShipMergeError> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(ShipMergeError::PermissionDenied {
                    path: path.to_path_buf(),
                });
            }
            Err(_) => {
                return Err(ShipMergeError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
        };

        let mime_type = if bytes.starts_with(b"%PDF") {
            PDF_MIME
        } else {
            "application/octet-stream"
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        Ok(Self::new(bytes, mime_type, file_name))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Consume the document, yielding its raw bytes for the request body.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Holds up to three named document references.
///
/// Slots are filled independently and idempotently; there is no ordering
/// constraint between them.
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
    invoice: Option<Document>,
    packing_slip: Option<Document>,
    shipping_label: Option<Document>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a candidate document to a slot.
    ///
    /// Rejects (without mutating the slot) any candidate whose declared type
    /// is not `application/pdf`. Re-assigning a slot overwrites it.
    pub fn assign(&mut self, slot: SlotName, candidate: Document) -> Result<(), ShipMergeError> {
        if candidate.mime_type() != PDF_MIME {
            return Err(ShipMergeError::InvalidFileType {
                slot,
                mime_type: candidate.mime_type().to_string(),
            });
        }
        *self.slot_mut(slot) = Some(candidate);
        Ok(())
    }

    /// The document currently held by `slot`, if any.
    pub fn get(&self, slot: SlotName) -> Option<&Document> {
        match slot {
            SlotName::Invoice => self.invoice.as_ref(),
            SlotName::PackingSlip => self.packing_slip.as_ref(),
            SlotName::ShippingLabel => self.shipping_label.as_ref(),
        }
    }

    /// Pure precondition gate: true when every slot holds a document.
    pub fn all_filled(&self) -> bool {
        SlotName::ALL.iter().all(|s| self.get(*s).is_some())
    }

    /// The slots still waiting for a document, in payload order.
    pub fn missing(&self) -> Vec<SlotName> {
        SlotName::ALL
            .iter()
            .copied()
            .filter(|s| self.get(*s).is_none())
            .collect()
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        self.invoice = None;
        self.packing_slip = None;
        self.shipping_label = None;
    }

    /// Clone the current contents for a request build.
    ///
    /// Returns the missing slots instead when the registry is incomplete.
    /// The clone is what makes a request immune to slot mutation while it is
    /// in flight.
    pub(crate) fn snapshot(&self) -> Result<Vec<(SlotName, Document)>, Vec<SlotName>> {
        let mut docs = Vec::with_capacity(SlotName::ALL.len());
        let mut missing = Vec::new();
        for slot in SlotName::ALL {
            match self.get(slot) {
                Some(doc) => docs.push((slot, doc.clone())),
                None => missing.push(slot),
            }
        }
        if missing.is_empty() {
            Ok(docs)
        } else {
            Err(missing)
        }
    }

    fn slot_mut(&mut self, slot: SlotName) -> &mut Option<Document> {
        match slot {
            SlotName::Invoice => &mut self.invoice,
            SlotName::PackingSlip => &mut self.packing_slip,
            SlotName::ShippingLabel => &mut self.shipping_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_doc(name: &str) -> Document {
        Document::new(b"%PDF-1.4 test".to_vec(), PDF_MIME, name)
    }

    #[test]
    fn assign_pdf_fills_slot() {
        let mut reg = SlotRegistry::new();
        reg.assign(SlotName::Invoice, pdf_doc("inv.pdf")).unwrap();
        assert_eq!(reg.get(SlotName::Invoice).unwrap().file_name(), "inv.pdf");
        assert!(!reg.all_filled());
    }

    #[test]
    fn non_pdf_is_rejected_and_slot_untouched() {
        let mut reg = SlotRegistry::new();
        for slot in SlotName::ALL {
            let bad = Document::new(b"PNG...".to_vec(), "image/png", "scan.png");
            let err = reg.assign(slot, bad).unwrap_err();
            assert!(matches!(
                err,
                ShipMergeError::InvalidFileType { slot: s, .. } if s == slot
            ));
            assert!(reg.get(slot).is_none(), "{slot} must stay empty");
        }
    }

    #[test]
    fn rejected_assignment_keeps_previous_document() {
        let mut reg = SlotRegistry::new();
        reg.assign(SlotName::ShippingLabel, pdf_doc("label_v1.pdf"))
            .unwrap();

        let bad = Document::new(b"hello".to_vec(), "text/plain", "label.txt");
        assert!(reg.assign(SlotName::ShippingLabel, bad).is_err());

        assert_eq!(
            reg.get(SlotName::ShippingLabel).unwrap().file_name(),
            "label_v1.pdf"
        );
    }

    #[test]
    fn reassignment_overwrites() {
        let mut reg = SlotRegistry::new();
        reg.assign(SlotName::Invoice, pdf_doc("v1.pdf")).unwrap();
        reg.assign(SlotName::Invoice, pdf_doc("v2.pdf")).unwrap();
        assert_eq!(reg.get(SlotName::Invoice).unwrap().file_name(), "v2.pdf");
    }

    #[test]
    fn missing_reports_in_payload_order() {
        let mut reg = SlotRegistry::new();
        reg.assign(SlotName::PackingSlip, pdf_doc("slip.pdf"))
            .unwrap();
        assert_eq!(
            reg.missing(),
            vec![SlotName::Invoice, SlotName::ShippingLabel]
        );
    }

    #[test]
    fn all_filled_after_three_assignments() {
        let mut reg = SlotRegistry::new();
        for slot in SlotName::ALL {
            reg.assign(slot, pdf_doc("doc.pdf")).unwrap();
        }
        assert!(reg.all_filled());
        assert!(reg.missing().is_empty());
        assert!(reg.snapshot().is_ok());
    }

    #[test]
    fn snapshot_of_incomplete_registry_lists_missing() {
        let reg = SlotRegistry::new();
        let missing = reg.snapshot().unwrap_err();
        assert_eq!(missing, SlotName::ALL.to_vec());
    }

    #[test]
    fn clear_empties_every_slot() {
        let mut reg = SlotRegistry::new();
        for slot in SlotName::ALL {
            reg.assign(slot, pdf_doc("doc.pdf")).unwrap();
        }
        reg.clear();
        assert_eq!(reg.missing().len(), 3);
    }

    #[test]
    fn from_path_sniffs_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("real.pdf");
        std::fs::write(&pdf, b"%PDF-1.7\n...").unwrap();
        let doc = Document::from_path(&pdf).unwrap();
        assert_eq!(doc.mime_type(), PDF_MIME);
        assert_eq!(doc.file_name(), "real.pdf");

        // A .pdf extension does not make it a PDF.
        let fake = dir.path().join("fake.pdf");
        std::fs::write(&fake, b"just text").unwrap();
        let doc = Document::from_path(&fake).unwrap();
        assert_eq!(doc.mime_type(), "application/octet-stream");
    }

    #[test]
    fn from_path_missing_file() {
        let err = Document::from_path("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, ShipMergeError::FileNotFound { .. }));
    }

    #[test]
    fn field_names_match_wire_contract() {
        assert_eq!(SlotName::Invoice.field_name(), "invoice");
        assert_eq!(SlotName::PackingSlip.field_name(), "packing_slip");
        assert_eq!(SlotName::ShippingLabel.field_name(), "shipping_label");
    }
}
