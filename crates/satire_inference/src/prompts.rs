pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a witty and satirical news commentator. \
Your summaries should be humorous while maintaining the essence of the original story.";

pub fn summary_prompt(content: &str) -> String {
    format!(
        "Please provide a humorous and satirical summary of the following news article in 2-3 sentences.\n\
         Make it witty and entertaining while maintaining the core message.\n\
         Use exaggeration and irony where appropriate.\n\n\
         Article content:\n{}",
        content
    )
}

pub fn image_prompt(summary: &str) -> String {
    format!(
        "Create a humorous and satirical illustration for the following news summary.\n\
         The image should be in a cartoon style, exaggerated and funny, suitable for a satirical news article.\n\n\
         Summary:\n{}",
        summary
    )
}
