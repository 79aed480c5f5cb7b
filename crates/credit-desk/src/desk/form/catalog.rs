use serde::Serialize;

/// Section of the form a field is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormGroup {
    Personal,
    Financial,
    Credit,
    Additional,
}

impl FormGroup {
    pub fn title(&self) -> &'static str {
        match self {
            FormGroup::Personal => "Personal details",
            FormGroup::Financial => "Financial position",
            FormGroup::Credit => "Credit details",
            FormGroup::Additional => "Additional information",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    pub group: FormGroup,
}

struct KnownField {
    name: &'static str,
    label: &'static str,
    description: &'static str,
    group: FormGroup,
}

const KNOWN_FIELDS: &[KnownField] = &[
    KnownField {
        name: "age",
        label: "Age",
        description: "Applicant age in years.",
        group: FormGroup::Personal,
    },
    KnownField {
        name: "personal_status",
        label: "Personal status",
        description: "Marital status and sex as recorded in the dataset.",
        group: FormGroup::Personal,
    },
    KnownField {
        name: "job",
        label: "Job",
        description: "Skill level of the applicant's employment.",
        group: FormGroup::Personal,
    },
    KnownField {
        name: "num_dependents",
        label: "Dependents",
        description: "Number of people the applicant is liable to support.",
        group: FormGroup::Personal,
    },
    KnownField {
        name: "credit_amount",
        label: "Credit amount",
        description: "Requested loan amount.",
        group: FormGroup::Financial,
    },
    KnownField {
        name: "checking_status",
        label: "Checking account",
        description: "Balance band of the applicant's checking account.",
        group: FormGroup::Financial,
    },
    KnownField {
        name: "savings_status",
        label: "Savings",
        description: "Balance band of savings accounts and bonds.",
        group: FormGroup::Financial,
    },
    KnownField {
        name: "housing",
        label: "Housing",
        description: "Whether the applicant owns, rents or lives for free.",
        group: FormGroup::Financial,
    },
    KnownField {
        name: "property_magnitude",
        label: "Property",
        description: "Most valuable property held by the applicant.",
        group: FormGroup::Financial,
    },
    KnownField {
        name: "duration",
        label: "Duration (months)",
        description: "Repayment period of the loan in months.",
        group: FormGroup::Credit,
    },
    KnownField {
        name: "purpose",
        label: "Purpose",
        description: "What the loan will be used for.",
        group: FormGroup::Credit,
    },
    KnownField {
        name: "installment_commitment",
        label: "Installment rate",
        description: "Installment as a share of disposable income, from 1 (low) to 4 (high).",
        group: FormGroup::Credit,
    },
    KnownField {
        name: "credit_history",
        label: "Credit history",
        description: "Repayment behaviour on earlier and existing credits.",
        group: FormGroup::Credit,
    },
    KnownField {
        name: "existing_credits",
        label: "Existing credits",
        description: "Number of credits already held at this bank.",
        group: FormGroup::Credit,
    },
    KnownField {
        name: "employment",
        label: "Employment",
        description: "Years with the current employer.",
        group: FormGroup::Additional,
    },
    KnownField {
        name: "residence_since",
        label: "Residence since",
        description: "Years at the current address, from 1 to 4.",
        group: FormGroup::Additional,
    },
    KnownField {
        name: "other_parties",
        label: "Other parties",
        description: "Co-applicant or guarantor on the loan, if any.",
        group: FormGroup::Additional,
    },
    KnownField {
        name: "other_payment_plans",
        label: "Other payment plans",
        description: "Installment plans held with other banks or stores.",
        group: FormGroup::Additional,
    },
    KnownField {
        name: "own_telephone",
        label: "Telephone",
        description: "Whether a telephone is registered in the applicant's name.",
        group: FormGroup::Additional,
    },
    KnownField {
        name: "foreign_worker",
        label: "Foreign worker",
        description: "Whether the applicant is a foreign worker.",
        group: FormGroup::Additional,
    },
];

/// Display metadata for `field`. Unknown fields keep their raw name, carry no
/// tooltip, and land in the additional section.
pub fn describe(field: &str) -> FieldDescriptor {
    match KNOWN_FIELDS.iter().find(|known| known.name == field) {
        Some(known) => FieldDescriptor {
            name: field.to_string(),
            label: known.label.to_string(),
            description: Some(known.description),
            group: known.group,
        },
        None => FieldDescriptor {
            name: field.to_string(),
            label: field.to_string(),
            description: None,
            group: FormGroup::Additional,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_fall_back_to_raw_name() {
        let descriptor = describe("telemetry_score");
        assert_eq!(descriptor.label, "telemetry_score");
        assert_eq!(descriptor.description, None);
        assert_eq!(descriptor.group, FormGroup::Additional);
    }

    #[test]
    fn known_fields_have_tooltips() {
        let descriptor = describe("duration");
        assert_eq!(descriptor.group, FormGroup::Credit);
        assert!(descriptor.description.is_some());
    }
}
