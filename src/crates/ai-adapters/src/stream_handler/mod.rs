mod anthropic;

pub use anthropic::handle_anthropic_stream;
