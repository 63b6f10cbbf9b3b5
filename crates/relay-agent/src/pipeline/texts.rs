//! Fixed user-facing texts.

pub const WELCOME: &str = "👋 Hi! I'm your personal assistant, ready to help with any question. 🚀\n\n\
I can:\n\n\
✨ Answer the questions you're curious about.\n\
📚 Help with study, work or creative projects.\n\
🧠 Find new ideas and solutions.\n\n\
Just write what you need and I'll do my best to help! 💬";

pub const HISTORY_CLEARED: &str = "🧹 Request history cleared!\n\n\
We're starting with a clean slate. ✨ Ask something new or carry on as if we just met.\n\n\
💡 Feel free to share your ideas or tasks, I'm always happy to help! 😊\n\n\
What would you like to discuss? 📝";

pub const HISTORY_ALREADY_EMPTY: &str = "🧹 Request history cleared!\n\n\
Looks like we had no history yet, but that's no problem: there's always time to start something new. 😊\n\n\
Tell me what you're interested in and I'll gladly help! 💬";

pub const PROCESSING: &str = "⏳ Processing your request...";

pub const APOLOGY: &str = "⚠️ Oops! Something went wrong.\n\n\
An error occurred while processing your request. It may be a temporary problem.\n\n\
If the error keeps happening, please contact the bot owner. 🙏\n\n\
Sorry for the inconvenience! 😊";
