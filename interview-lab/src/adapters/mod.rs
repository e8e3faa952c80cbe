/// Gemini `generateContent` backend.
pub mod gemini;
