use super::matcher::Candidate;
use super::{MergedRecord, Offer, Provenance};

/// Resolve a candidate's offer.
///
/// The primary record wins when found. Otherwise a found secondary record
/// supplies the offer fields and the record is tagged as secondary. When both
/// miss the offer stays empty.
pub fn fill_gaps(candidate: Candidate) -> MergedRecord {
    let Candidate {
        component,
        primary,
        secondary,
    } = candidate;

    let (offer, provenance) = if primary.found {
        (Offer::from(&primary), Provenance::Primary)
    } else if let Some(secondary) = secondary.as_ref().filter(|r| r.found) {
        log::debug!(
            "{}: {} has no match at {}, using {}",
            component.reference,
            primary.query,
            primary.supplier,
            secondary.supplier
        );
        (Offer::from(secondary), Provenance::Secondary)
    } else {
        (Offer::default(), Provenance::None)
    };

    MergedRecord {
        component,
        primary,
        secondary,
        offer,
        provenance,
    }
}

pub fn fill_all(candidates: Vec<Candidate>) -> Vec<MergedRecord> {
    candidates.into_iter().map(fill_gaps).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Component;
    use crate::supplier::SupplierRecord;
    use rust_decimal_macros::dec;

    fn secondary_hit() -> SupplierRecord {
        let mut record = SupplierRecord::found("DigiKey", "ABC");
        record.unit_price = Some(dec!(0.07));
        record.stock = Some(1200);
        record.manufacturer = Some("Yageo".to_string());
        record.order_code = Some("311-ABC-ND".to_string());
        record
    }

    fn candidate(primary: SupplierRecord, secondary: Option<SupplierRecord>) -> Candidate {
        Candidate {
            component: Component::new("R1", "10k", "0603").with_field("MPN", "ABC"),
            primary,
            secondary,
        }
    }

    #[test]
    fn test_primary_miss_secondary_hit() {
        let merged = fill_gaps(candidate(
            SupplierRecord::not_found("Mouser", "ABC"),
            Some(secondary_hit()),
        ));
        assert_eq!(merged.provenance, Provenance::Secondary);
        assert_eq!(merged.offer.unit_price, Some(dec!(0.07)));
        assert_eq!(merged.offer.stock, Some(1200));
        assert_eq!(merged.offer.manufacturer.as_deref(), Some("Yageo"));
        assert_eq!(merged.offer.order_code.as_deref(), Some("311-ABC-ND"));
        assert_eq!(merged.offer.supplier.as_deref(), Some("DigiKey"));
    }

    #[test]
    fn test_primary_hit_wins() {
        let mut primary = SupplierRecord::found("Mouser", "ABC");
        primary.unit_price = Some(dec!(0.05));
        let merged = fill_gaps(candidate(primary, Some(secondary_hit())));
        assert_eq!(merged.provenance, Provenance::Primary);
        assert_eq!(merged.offer.unit_price, Some(dec!(0.05)));
        assert!(merged.alternative().is_some());
    }

    #[test]
    fn test_both_miss_is_empty() {
        let merged = fill_gaps(candidate(
            SupplierRecord::not_found("Mouser", "ABC"),
            Some(SupplierRecord::not_found("DigiKey", "ABC")),
        ));
        assert_eq!(merged.provenance, Provenance::None);
        assert_eq!(merged.offer, Offer::default());
        assert!(merged.alternative().is_none());
    }

    #[test]
    fn test_primary_only_skips_secondary() {
        let merged = fill_gaps(candidate(SupplierRecord::not_found("Mouser", "ABC"), None));
        assert_eq!(merged.provenance, Provenance::None);
        assert!(merged.secondary.is_none());
    }
}
