pub mod auth;
pub mod chat;
pub mod domain;
pub mod formatting;
pub mod hash;
pub mod history;
pub mod memory;
pub mod ports;
pub mod records;
pub mod store;

pub use auth::Auth;
pub use chat::{Conversation, ConversationKind};
pub use domain::{
    ChatMessage, Curriculum, DailyTasks, GeneratedPlan, PlanRequest, Role, StudyPlan, Task,
    TutorSession, WeeklyPlan,
};
pub use history::{CompanionHistory, PlanHistory, TutorHistory};
pub use memory::MemoryStore;
pub use ports::{
    AiFailure, ChatService, KeyValueStore, PortError, PortResult, SourceFormattingService,
    StudyPlanService, TextStream,
};
pub use store::RecordStore;
