use glrules_core::error::GlRulesError;
use glrules_core::model::{Amount, EvaluationRequest, InputContext};
use std::path::PathBuf;

use crate::output;
use crate::SourceArgs;

/// Request fields given as flags.
pub struct RequestFields {
    pub mcc: Option<String>,
    pub merchant: Option<String>,
    pub amount: Option<String>,
    pub team: Option<String>,
    pub email: Option<String>,
    pub state: Option<String>,
}

impl RequestFields {
    fn apply(self, req: &mut EvaluationRequest) {
        if let Some(mcc) = self.mcc {
            req.mcc = mcc;
        }
        if let Some(merchant) = self.merchant {
            req.merchant = merchant;
        }
        if let Some(amount) = self.amount {
            req.amount = Amount::parse(&amount);
        }
        if let Some(team) = self.team {
            req.user_team = team;
        }
        if let Some(email) = self.email {
            req.user_email = email;
        }
        if let Some(state) = self.state {
            req.state_match = state;
        }
    }
}

pub fn run(
    source: &SourceArgs,
    request_file: Option<PathBuf>,
    fields: RequestFields,
    budget: Option<String>,
    output_format: &str,
) -> Result<(), GlRulesError> {
    let classifier = super::load_classifier(source)?;

    let mut request = match request_file {
        Some(path) => {
            let bytes = std::fs::read(&path)?;
            serde_json::from_slice::<EvaluationRequest>(&bytes)?
        }
        None => EvaluationRequest::default(),
    };
    fields.apply(&mut request);

    let input = InputContext::from(request);
    let result = classifier.classify(&input, budget.as_deref().unwrap_or_default());

    match output_format {
        "json" => output::json::print(&result)?,
        _ => output::table::print_result(&result),
    }

    Ok(())
}
