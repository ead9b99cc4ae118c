mod chat;
mod images;
mod model_list;
mod transcription;

pub use chat::{
    OpenaiChatChoice, OpenaiChatMessage, OpenaiChatRequest, OpenaiChatResponse,
    OpenaiChoiceMessage,
};
pub use images::{OpenaiImageData, OpenaiImageRequest, OpenaiImageResponse};
pub use model_list::{OpenaiModel, OpenaiModelList};
pub use transcription::OpenaiTranscriptionResponse;
