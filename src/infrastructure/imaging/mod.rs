mod webp_transcoder;

pub use webp_transcoder::WebpTranscoder;
