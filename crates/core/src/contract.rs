//! Rental contract text rendered from an embedded template, shown on the
//! signature step and by the contract view.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tera::{Context, Tera};
use thiserror::Error;

use crate::booking::states::RentalTerms;
use crate::domain::customer::Customer;
use crate::domain::rental::{Rental, RentalId};
use crate::domain::vehicle::Vehicle;
use crate::pricing;

const CONTRACT_TEMPLATE: &str = include_str!("../templates/contract.txt");
const TEMPLATE_NAME: &str = "contract.txt";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(String),
}

/// Everything the contract text needs, assembled by the caller. The
/// wizard renders before an id exists; the contract view renders a
/// persisted rental.
#[derive(Clone, Debug)]
pub struct ContractData<'a> {
    pub rental_id: Option<RentalId>,
    pub customer: &'a Customer,
    pub vehicle: &'a Vehicle,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: Decimal,
    pub consent_at: Option<DateTime<Utc>>,
    pub customer_signed: bool,
    pub company_signed: bool,
}

impl<'a> ContractData<'a> {
    pub fn for_terms(customer: &'a Customer, vehicle: &'a Vehicle, terms: &RentalTerms) -> Self {
        Self {
            rental_id: None,
            customer,
            vehicle,
            start_date: terms.start_date,
            end_date: terms.end_date,
            total_price: terms.total_price,
            consent_at: None,
            customer_signed: false,
            company_signed: false,
        }
    }

    pub fn for_rental(rental: &Rental, customer: &'a Customer, vehicle: &'a Vehicle) -> Self {
        Self {
            rental_id: Some(rental.id),
            customer,
            vehicle,
            start_date: rental.start_date,
            end_date: rental.end_date,
            total_price: rental.total_price,
            consent_at: rental.digital_consent_at,
            customer_signed: rental.has_customer_signature(),
            company_signed: rental
                .company_signature
                .as_ref()
                .is_some_and(|signature| !signature.is_blank()),
        }
    }
}

pub struct ContractRenderer {
    tera: Tera,
}

impl ContractRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, CONTRACT_TEMPLATE)
            .map_err(|error| RenderError::Template(error.to_string()))?;
        Ok(Self { tera })
    }

    pub fn render(&self, data: &ContractData<'_>) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("rental_id", &data.rental_id.map(|id| id.0));
        context.insert("customer_name", &data.customer.full_name());
        context.insert("customer_email", &data.customer.email);
        context.insert("customer_phone", &data.customer.phone);
        context.insert("id_card_number", &data.customer.id_card_number);
        context.insert("license_number", &data.customer.license_number);
        context.insert("vehicle_label", &data.vehicle.brand);
        context.insert("license_plate", &data.vehicle.license_plate);
        context.insert("vin", &data.vehicle.vin);
        context.insert("year", &data.vehicle.year);
        context.insert("inspection_until", &format_date(data.vehicle.inspection_until));
        context.insert("insurance_note", &data.vehicle.insurance_note);
        context.insert("start_date", &format_timestamp(data.start_date));
        context.insert("end_date", &format_timestamp(data.end_date));
        context.insert("days", &pricing::billed_days(data.start_date, data.end_date));
        context.insert("total_price", &data.total_price.to_string());
        context.insert("consent_at", &data.consent_at.map(format_timestamp));
        context.insert("customer_signature", signature_line(data.customer_signed));
        context.insert("company_signature", signature_line(data.company_signed));

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|error| RenderError::Template(error.to_string()))
    }
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format("%d.%m.%Y %H:%M").to_string()
}

fn format_date(value: chrono::NaiveDate) -> String {
    value.format("%d.%m.%Y").to_string()
}

fn signature_line(signed: bool) -> &'static str {
    if signed {
        "podepsáno elektronicky"
    } else {
        "____________________"
    }
}
