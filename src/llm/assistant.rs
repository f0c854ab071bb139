use log::info;

use crate::error::{Result, SalesPulseError};
use crate::llm::client::CompletionService;
use crate::llm::prompts::{build_prompt, DatasetSummary};
use crate::sampling::{select_sample, SampleBudget};
use crate::schema::SalesRecord;

/// Answers questions about aggregated sales records through a completion service.
pub struct SalesAssistant<C> {
    service: C,
    budget: SampleBudget,
}

impl<C: CompletionService> SalesAssistant<C> {
    pub fn new(service: C) -> Self {
        Self {
            service,
            budget: SampleBudget::default(),
        }
    }

    pub fn with_budget(mut self, budget: SampleBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    /// Ask a question about the aggregated records.
    ///
    /// # Arguments
    /// * `question` - The user's question, appended as the final instruction
    /// * `records` - The full aggregated dataset; sampling happens here
    /// * `loaded_months` - Display names of the months present in `records`
    pub async fn ask(
        &self,
        question: &str,
        records: &[SalesRecord],
        loaded_months: &[String],
    ) -> Result<String> {
        if records.is_empty() {
            return Err(SalesPulseError::NoDataLoaded);
        }

        info!("Processing question: {}", question);
        info!("Sales data records: {}", records.len());

        let sample = select_sample(records, loaded_months.len(), self.budget);
        let summary = DatasetSummary::describe(records, loaded_months);
        let prompt = build_prompt(&sample, &summary, question)?;

        let answer = self.service.complete(&prompt).await?;
        info!(
            "Analysis completed ({} of {} records sent)",
            sample.len(),
            records.len()
        );
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::CompletionPrompt;
    use crate::schema::Month;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingService {
        prompts: Mutex<Vec<CompletionPrompt>>,
    }

    #[async_trait]
    impl CompletionService for RecordingService {
        async fn complete(&self, prompt: &CompletionPrompt) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.clone());
            Ok("Receita total: R$ 30".to_string())
        }
    }

    fn records(n: usize) -> Vec<SalesRecord> {
        (0..n)
            .map(|i| {
                let mut r: SalesRecord = [("linha", json!(i)), ("valor", json!(10))]
                    .into_iter()
                    .collect();
                r.stamp_month(Month::from_index(0).unwrap());
                r
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_dataset_never_reaches_service() {
        let assistant = SalesAssistant::new(RecordingService::default());
        let result = assistant.ask("Total?", &[], &[]).await;

        assert!(matches!(result, Err(SalesPulseError::NoDataLoaded)));
        assert!(assistant.service().prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_answer_is_returned_verbatim() {
        let assistant = SalesAssistant::new(RecordingService::default());
        let months = vec!["Janeiro".to_string()];
        let answer = assistant.ask("Total?", &records(3), &months).await.unwrap();

        assert_eq!(answer, "Receita total: R$ 30");
        let prompts = assistant.service().prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].user.contains("- Total de transações: 3"));
    }

    #[tokio::test]
    async fn test_prompt_carries_only_the_sample() {
        let assistant = SalesAssistant::new(RecordingService::default()).with_budget(SampleBudget {
            total: 5,
            min_per_month: 2,
        });
        let months = vec!["Janeiro".to_string()];
        assistant.ask("Total?", &records(20), &months).await.unwrap();

        let prompts = assistant.service().prompts.lock().unwrap();
        assert_eq!(prompts[0].user.matches("\"linha\":").count(), 5);
        assert!(prompts[0].user.contains("- Total de transações: 20"));
    }
}
