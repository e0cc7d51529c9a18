use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::model::CanonicalField;

/// Header spellings recognised for each canonical field.
///
/// List order is precedence order: when a table carries headers for two
/// synonyms of the same field, the one listed first wins. The table is
/// validated on construction and is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SynonymSpec", into = "SynonymSpec")]
pub struct SynonymTable {
    product_id: Vec<String>,
    quantity: Vec<String>,
    order_id: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SynonymSpec {
    product_id: Vec<String>,
    quantity: Vec<String>,
    #[serde(default)]
    order_id: Vec<String>,
}

impl SynonymTable {
    pub fn new(
        product_id: Vec<String>,
        quantity: Vec<String>,
        order_id: Vec<String>,
    ) -> Result<Self, MergeError> {
        let table = Self {
            product_id: trimmed(product_id),
            quantity: trimmed(quantity),
            order_id: trimmed(order_id),
        };
        table.validate()?;
        Ok(table)
    }

    #[must_use]
    pub fn synonyms(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::ProductId => &self.product_id,
            CanonicalField::Quantity => &self.quantity,
            CanonicalField::OrderId => &self.order_id,
        }
    }

    fn validate(&self) -> Result<(), MergeError> {
        let mut owners: HashMap<String, CanonicalField> = HashMap::new();

        for field in CanonicalField::ALL {
            let spellings = self.synonyms(field);
            if field.is_required() && spellings.is_empty() {
                return Err(MergeError::InvalidConfig(format!(
                    "no header spellings configured for required field {field}"
                )));
            }

            for spelling in spellings {
                if spelling.is_empty() {
                    return Err(MergeError::InvalidConfig(format!(
                        "blank header spelling listed for {field}"
                    )));
                }

                let key = spelling.to_ascii_lowercase();
                if let Some(owner) = owners.get(&key) {
                    if *owner != field {
                        return Err(MergeError::InvalidConfig(format!(
                            "header '{spelling}' is listed for both {owner} and {field}"
                        )));
                    }
                    continue;
                }
                owners.insert(key, field);
            }
        }

        Ok(())
    }
}

fn trimmed(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .collect()
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self {
            product_id: owned(&[
                "ProductID",
                "SKU",
                "Product ID",
                "Seller SKU",
                "SKU ID",
                "Sku",
                "Product Code",
                "Item SKU",
            ]),
            quantity: owned(&[
                "Quantity",
                "Qty",
                "Qty to Ship",
                "Item Qty",
                "Final Qty",
                "Total_Quantity",
                "Total Quantity",
            ]),
            order_id: owned(&[
                "OrderID",
                "Order ID",
                "Order Id",
                "Sub Order No",
                "Suborder ID",
                "Order Number",
            ]),
        }
    }
}

impl TryFrom<SynonymSpec> for SynonymTable {
    type Error = MergeError;

    fn try_from(spec: SynonymSpec) -> Result<Self, Self::Error> {
        Self::new(spec.product_id, spec.quantity, spec.order_id)
    }
}

impl From<SynonymTable> for SynonymSpec {
    fn from(table: SynonymTable) -> Self {
        Self {
            product_id: table.product_id,
            quantity: table.quantity,
            order_id: table.order_id,
        }
    }
}
