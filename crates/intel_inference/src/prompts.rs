use intel_core::ScrapedArticle;

/// System prompt steering the model toward schema-conformant JSON output.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an expert analyst for enterprise competitive intelligence.
Your task is to analyze news articles and extract key information in a structured format.

You must respond with ONLY valid JSON matching this exact schema:
{
  "summary": "string (20-500 characters)",
  "entities": [
    {
      "text": "string",
      "type": "company|person|product|technology",
      "mentions": number (>= 1)
    }
  ],
  "classification": "competitive_news|personnel_change|product_launch|market_trend",
  "sentimentScore": number (1-10)
}

Guidelines:
- summary: Concise 1-2 sentence summary of the article
- entities: Extract up to 10 most important entities (companies, people, products, technologies)
- classification: Choose ONE that best fits the article
- sentimentScore: 1=very negative, 5=neutral, 10=very positive

Respond with ONLY the JSON object, no additional text."#;

/// Assembles the user prompt for one article, embedding its already-truncated
/// content.
pub fn build_analysis_prompt(article: &ScrapedArticle, truncated_content: &str) -> String {
    format!(
        "Analyze this article:\n\n\
         Title: {}\n\
         URL: {}\n\
         Published: {}\n\n\
         Content:\n{}\n\n\
         Provide your analysis as a JSON object following the schema provided.",
        article.title,
        article.url,
        article.publish_date.to_rfc3339(),
        truncated_content
    )
}
