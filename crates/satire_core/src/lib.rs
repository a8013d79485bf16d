pub mod error;
pub mod inference;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use inference::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ImageData,
    ImageGenerator, ImageRequest, ImageResponse, ImageResponseFormat, ImageSize, Role,
    TextGenerator,
};
pub use storage::ArticleStorage;
pub use types::{
    Article, GenerationOutcome, GenerationRequest, GenerationResult, GenerationStatus, NewArticle,
};

pub mod prelude {
    pub use crate::{Article, ArticleStorage, Error, ImageGenerator, NewArticle, Result, TextGenerator};
}
