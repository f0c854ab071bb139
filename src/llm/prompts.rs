// Prompt text for the sales analysis assistant

use crate::error::Result;
use crate::llm::types::CompletionPrompt;
use crate::schema::SalesRecord;

pub const SYSTEM_PROMPT_SALES_ANALYST: &str = r#"Você é um analista de dados especializado em vendas. Você TEM CAPACIDADE de processar e analisar dados JSON.

**INSTRUÇÕES CRÍTICAS:**
1. Você DEVE processar os dados JSON fornecidos
2. Você PODE e DEVE fazer cálculos matemáticos (somas, médias, porcentagens)
3. Analise os dados reais, NÃO use placeholders como "R$ X"
4. Forneça números específicos e exatos
5. Use a coluna que representa valor/receita para cálculos financeiros
6. Use a coluna "month_name" para agrupar por mês

**FORMATO DE RESPOSTA:**
- Números reais e específicos
- Mostre cálculos quando relevante
- Seja direto e objetivo
- Inclua insights acionáveis"#;

/// Everything the user block says about the data besides the sampled rows.
#[derive(Debug, Clone)]
pub struct DatasetSummary<'a> {
    pub total_records: usize,
    pub loaded_months: &'a [String],
    pub columns: Vec<String>,
}

impl<'a> DatasetSummary<'a> {
    /// Column list is taken from the first record.
    pub fn describe(records: &[SalesRecord], loaded_months: &'a [String]) -> Self {
        let columns = records
            .first()
            .map(|r| r.columns().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            total_records: records.len(),
            loaded_months,
            columns,
        }
    }
}

pub fn build_user_prompt(
    sample: &[SalesRecord],
    summary: &DatasetSummary<'_>,
    question: &str,
) -> Result<String> {
    let data = serde_json::to_string_pretty(sample)?;
    Ok(format!(
        "**DADOS DE VENDAS (formato JSON):**\n\
         {}\n\n\
         **INFORMAÇÕES:**\n\
         - Total de transações: {}\n\
         - Meses com dados: {}\n\
         - Colunas: {}\n\n\
         **PERGUNTA:** {}",
        data,
        summary.total_records,
        summary.loaded_months.join(", "),
        summary.columns.join(", "),
        question
    ))
}

pub fn build_prompt(
    sample: &[SalesRecord],
    summary: &DatasetSummary<'_>,
    question: &str,
) -> Result<CompletionPrompt> {
    Ok(CompletionPrompt {
        system: SYSTEM_PROMPT_SALES_ANALYST.to_string(),
        user: build_user_prompt(sample, summary, question)?,
    })
}
