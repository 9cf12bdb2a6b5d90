use serde::Serialize;

/// JSON body of `POST /api/stockx-clean/market-data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MarketDataRequest<'a> {
    pub product_id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub is_variant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervals: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl<'a> MarketDataRequest<'a> {
    pub fn variant(product_id: &'a str, kind: &'static str) -> Self {
        Self {
            product_id,
            kind,
            is_variant: true,
            intervals: None,
            start_date: None,
            end_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_are_omitted() {
        let body = MarketDataRequest::variant("v-1", "sales");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "productId": "v-1", "type": "sales", "isVariant": true })
        );
    }

    #[test]
    fn test_historical_body_uses_camel_case() {
        let body = MarketDataRequest {
            intervals: Some(400),
            start_date: Some("2024-01-13".to_string()),
            end_date: Some("2024-02-01".to_string()),
            ..MarketDataRequest::variant("v-1", "historical")
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "productId": "v-1",
                "type": "historical",
                "isVariant": true,
                "intervals": 400,
                "startDate": "2024-01-13",
                "endDate": "2024-02-01"
            })
        );
    }
}
