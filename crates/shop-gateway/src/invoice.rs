//! # Invoice Operations
//!
//! The invoicing API is a single JSON endpoint; the operation is selected
//! by the `transactionType` field (`CREATE_INVOICE`, `CHECK_STATUS`,
//! `REMOVE_INVOICE`). Request and response field names are fixed by the
//! third-party gateway and must match exactly.
//!
//! Every call is a blocking single attempt: a network failure, a non-2xx
//! status, or an unparseable body is reported as a gateway-error outcome,
//! never a panic and never a fake success. `check_invoice` is read-only and
//! safe to retry; `create_invoice` must not be blindly retried without
//! reusing the already-generated order reference, or the customer ends up
//! with duplicate invoices.

use crate::config::GatewayConfig;
use crate::signature::generate_signature;
use chrono::Utc;
use rand::Rng;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use shop_core::{Order, ShopError, ShopResult};
use tracing::{debug, error, info, instrument};

/// Prefix for generated order references
const ORDER_REFERENCE_PREFIX: &str = "DH";

/// Explicit invoice request: every recognized field enumerated, the three
/// product lists parallel and index-aligned.
#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    /// Total amount to invoice
    pub amount: Decimal,

    /// ISO currency code (e.g., "UAH")
    pub currency: String,

    /// Merchant auth type; the gateway default scheme
    pub auth_type: String,

    pub product_names: Vec<String>,
    pub product_prices: Vec<Decimal>,
    pub product_counts: Vec<u32>,
}

impl InvoiceRequest {
    /// Build an invoice request from a persisted order snapshot
    pub fn from_order(order: &Order, currency: impl Into<String>) -> Self {
        Self {
            amount: order.total_cost(),
            currency: currency.into(),
            auth_type: "SimpleSignature".to_string(),
            product_names: order.items.iter().map(|i| i.name.clone()).collect(),
            product_prices: order.items.iter().map(|i| i.price).collect(),
            product_counts: order.items.iter().map(|i| i.quantity).collect(),
        }
    }

    fn validate(&self) -> ShopResult<()> {
        if self.product_names.is_empty() {
            return Err(ShopError::Validation(
                "invoice request has no products".to_string(),
            ));
        }
        if self.product_names.len() != self.product_prices.len()
            || self.product_names.len() != self.product_counts.len()
        {
            return Err(ShopError::Validation(
                "product name/price/count lists must be parallel".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of `CREATE_INVOICE`. Only `order_reference` is ever persisted.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceCreateResult {
    pub invoice_url: String,
    pub reason: Option<String>,
    pub reason_code: Option<String>,
    pub qr_code: Option<String>,
    /// The reference generated client-side for this invoice
    pub order_reference: String,
}

/// Full transaction snapshot returned by `CHECK_STATUS`. Transient,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceStatus {
    pub reason: Option<String>,
    pub reason_code: Option<String>,
    pub order_reference: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub auth_code: Option<String>,
    pub created_date: Option<String>,
    pub processing_date: Option<String>,
    pub card_pan: Option<String>,
    pub card_type: Option<String>,
    pub issuer_bank_country: Option<String>,
    pub issuer_bank_name: Option<String>,
    pub transaction_status: Option<String>,
    pub refund_amount: Option<String>,
    pub settlement_date: Option<String>,
    pub settlement_amount: Option<String>,
    pub fee: Option<String>,
    pub merchant_signature: Option<String>,
}

impl InvoiceStatus {
    /// Whether the gateway reports this transaction approved
    pub fn is_approved(&self) -> bool {
        self.transaction_status.as_deref() == Some("Approved")
    }
}

/// Client for the invoicing gateway
pub struct InvoiceClient {
    config: GatewayConfig,
    client: Client,
}

impl InvoiceClient {
    /// Create a new client with a 30s transport timeout
    pub fn new(config: GatewayConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ShopError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        Self::new(GatewayConfig::from_env()?)
    }

    /// Generate a collision-resistant order reference: a fixed prefix plus
    /// ten random digits.
    pub fn generate_order_reference(&self) -> String {
        let digits: u64 = rand::thread_rng().gen_range(1_000_000_000..=9_999_999_999);
        format!("{}{}", ORDER_REFERENCE_PREFIX, digits)
    }

    /// Create an invoice for the given request.
    ///
    /// Generates the order reference, signs
    /// `merchantAccount;merchantDomainName;orderReference;orderDate;amount;
    /// currency;productName…;productCount…;productPrice…` (each list joined
    /// with `;`), and issues one synchronous call.
    #[instrument(skip(self, request), fields(amount = %request.amount, currency = %request.currency))]
    pub async fn create_invoice(&self, request: &InvoiceRequest) -> ShopResult<InvoiceCreateResult> {
        request.validate()?;

        let order_reference = self.generate_order_reference();
        self.create_invoice_with_reference(request, &order_reference)
            .await
    }

    /// Create an invoice reusing an already-generated order reference.
    /// This is the retry-safe entry point.
    pub async fn create_invoice_with_reference(
        &self,
        request: &InvoiceRequest,
        order_reference: &str,
    ) -> ShopResult<InvoiceCreateResult> {
        request.validate()?;

        let order_date = Utc::now().timestamp();
        let amount = request.amount.to_string();
        let names = request.product_names.join(";");
        let counts = request
            .product_counts
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(";");
        let prices = request
            .product_prices
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(";");

        let order_date_str = order_date.to_string();
        let signature = generate_signature(
            &self.config.secret_key,
            &[
                &self.config.merchant_account,
                &self.config.domain_name,
                order_reference,
                &order_date_str,
                &amount,
                &request.currency,
                &names,
                &counts,
                &prices,
            ],
        );

        let params = serde_json::json!({
            "transactionType": "CREATE_INVOICE",
            "merchantSecretKey": self.config.secret_key,
            "merchantAccount": self.config.merchant_account,
            "merchantAuthType": request.auth_type,
            "merchantDomainName": self.config.domain_name,
            "merchantSignature": signature,
            "apiVersion": "1",
            "orderReference": order_reference,
            "orderDate": order_date,
            "amount": amount,
            "currency": request.currency,
            "productName": request.product_names,
            "productPrice": request.product_prices.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            "productCount": request.product_counts.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
        });

        debug!("Creating invoice: reference={}", order_reference);

        let body = self.post(&params).await?;

        let invoice_url = body
            .get("invoiceUrl")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| {
                error!(
                    "Invoice creation rejected: reason={:?}, reasonCode={:?}",
                    body.get("reason"),
                    body.get("reasonCode")
                );
                ShopError::Gateway {
                    message: format!(
                        "no invoiceUrl in response (reason: {})",
                        field_str(&body, "reason").unwrap_or_else(|| "unknown".to_string())
                    ),
                }
            })?;

        info!("Invoice created: reference={}", order_reference);

        Ok(InvoiceCreateResult {
            invoice_url,
            reason: field_str(&body, "reason"),
            reason_code: field_str(&body, "reasonCode"),
            qr_code: field_str(&body, "qrCode"),
            order_reference: order_reference.to_string(),
        })
    }

    /// Query the current status of a previously created invoice.
    /// Read-only; no caller-side state transition.
    #[instrument(skip(self))]
    pub async fn check_invoice(&self, order_reference: &str) -> ShopResult<InvoiceStatus> {
        let signature = generate_signature(
            &self.config.secret_key,
            &[&self.config.merchant_account, order_reference],
        );

        let params = serde_json::json!({
            "transactionType": "CHECK_STATUS",
            "merchantSecretKey": self.config.secret_key,
            "merchantAccount": self.config.merchant_account,
            "orderReference": order_reference,
            "merchantSignature": signature,
            "apiVersion": "1",
        });

        let body = self.post(&params).await?;

        Ok(InvoiceStatus {
            reason: field_str(&body, "reason"),
            reason_code: field_str(&body, "reasonCode"),
            order_reference: field_str(&body, "orderReference"),
            amount: field_str(&body, "amount"),
            currency: field_str(&body, "currency"),
            auth_code: field_str(&body, "authCode"),
            created_date: field_str(&body, "createdDate"),
            processing_date: field_str(&body, "processingDate"),
            card_pan: field_str(&body, "cardPan"),
            card_type: field_str(&body, "cardType"),
            issuer_bank_country: field_str(&body, "issuerBankCountry"),
            issuer_bank_name: field_str(&body, "issuerBankName"),
            transaction_status: field_str(&body, "transactionStatus"),
            refund_amount: field_str(&body, "refundAmount"),
            settlement_date: field_str(&body, "settlementDate"),
            settlement_amount: field_str(&body, "settlementAmount"),
            fee: field_str(&body, "fee"),
            merchant_signature: field_str(&body, "merchantSignature"),
        })
    }

    /// Request cancellation of an invoice. The remote response code is
    /// authoritative: an already-settled invoice simply reports `false`.
    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, order_reference: &str) -> ShopResult<bool> {
        let signature = generate_signature(
            &self.config.secret_key,
            &[&self.config.merchant_account, order_reference],
        );

        let params = serde_json::json!({
            "transactionType": "REMOVE_INVOICE",
            "merchantSecretKey": self.config.secret_key,
            "merchantAccount": self.config.merchant_account,
            "orderReference": order_reference,
            "merchantSignature": signature,
            "apiVersion": "1",
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&params)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Verify an inbound callback against this client's shared secret
    pub fn verify_callback(&self, payload: &crate::callback::CallbackPayload) -> ShopResult<()> {
        payload.verify(&self.config)
    }

    /// Build the signed acknowledgement the gateway expects back
    pub fn ack(&self, order_reference: &str) -> crate::callback::CallbackAck {
        crate::callback::CallbackAck::accept(&self.config, order_reference)
    }

    /// Shared POST + parse path; transport and body failures both surface
    /// as gateway-error outcomes.
    async fn post(&self, params: &Value) -> ShopResult<Value> {
        let response = self
            .client
            .post(&self.config.api_url)
            .json(params)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Gateway error: status={}, body={}", status, text);
            return Err(ShopError::Gateway {
                message: format!("HTTP {}", status),
            });
        }

        serde_json::from_str(&text).map_err(|e| ShopError::Gateway {
            message: format!("unparseable response body: {}", e),
        })
    }
}

/// Tolerant field extraction: the gateway is loose about whether numeric
/// fields arrive as strings or numbers.
fn field_str(body: &Value, key: &str) -> Option<String> {
    match body.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
