pub const GENERIC_FAILURE_MSG: &str = "_❌ Something went wrong, try again later._";
pub const OWNER_ONLY_MSG: &str = "_🔒 This command is reserved for the bot owner._";
pub const MISSING_GEMINI_KEY_MSG: &str = "_❌ GEMINI_API_KEY is not configured._";

pub const EMOJI_X: &str = "❌";
pub const EMOJI_O: &str = "⭕";
pub const CELL_NUMBERS: [&str; 9] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣"];

pub const DRAFTS_DARK_MAN: &str = "⚫";
pub const DRAFTS_LIGHT_MAN: &str = "⚪";
pub const DRAFTS_DARK_KING: &str = "🔴";
pub const DRAFTS_LIGHT_KING: &str = "🟠";
pub const DRAFTS_DARK_SQUARE: &str = "🟫";
pub const DRAFTS_LIGHT_SQUARE: &str = "⬜";
pub const DRAFTS_SELECT_HINT: &str = "➡️ *Step 1:* Use *.move RC* (e.g. *.move 63*) to select a piece.";
pub const DRAFTS_DEST_HINT: &str = "➡️ *Step 2:* Reply with the *number* of the destination.";

pub const QUIZ_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];
pub const QUIZ_QUESTIONS: usize = 5;

pub const EIGHT_BALL_RESPONSES: [&str; 20] = [
	"It is certain.",
	"It is decidedly so.",
	"Without a doubt.",
	"Yes, definitely.",
	"You may rely on it.",
	"As I see it, yes.",
	"Most likely.",
	"Outlook good.",
	"Yes.",
	"Signs point to yes.",
	"Reply hazy, try again.",
	"Ask again later.",
	"Better not tell you now.",
	"Cannot predict now.",
	"Concentrate and ask again.",
	"Don't count on it.",
	"My reply is no.",
	"My sources say no.",
	"Outlook not so good.",
	"Very doubtful.",
];

pub const TRUTHS: [&str; 7] = [
	"What is the most expensive piece of gear you accidentally broke while refining?",
	"Admit one time you secretly stole an MVP from another party.",
	"What's one skill or class ability you secretly think is useless?",
	"What's the lowest amount of Zeny you've ever held at one time?",
	"Which character on your account is secretly your main?",
	"What's the most embarrassing way you've died in a high-level dungeon?",
	"Who in this chat do you think needs to change their entire build?",
];

pub const DARES: [&str; 7] = [
	"Change your main character's hair color to bright pink for the next 48 hours.",
	"Send a global message saying 'I love Porings!' right now.",
	"Auto-attack a Goblin Archer for 5 minutes and screenshot the combat log.",
	"Spend the next 30 minutes farming in an area that gives you 0 experience.",
	"Unequip all your armor and take a selfie next to an MVP.",
	"Post an absurdly low priced item on the Exchange for 5 minutes.",
	"Use only auto-attacks and no skills during your next 5 daily quests.",
];

pub const HACK_STEPS: [&str; 10] = [
	"🔍 Scanning system...",
	"📡 Connecting to server...",
	"🔑 Bypassing security...",
	"📂 Accessing files...",
	"⚡ Uploading payload...",
	"📊 Progress: 0%",
	"📊 Progress: 25%",
	"📊 Progress: 50%",
	"📊 Progress: 75%",
	"📊 Progress: 100%",
];

/// Alias accepted from users, Google language code, display name
pub const LANGUAGES: [(&str, &str, &str); 12] = [
	("en", "en", "English"),
	("sw", "sw", "Kiswahili"),
	("sheng", "sw", "Sheng (Nairobi Slang)"),
	("fr", "fr", "French"),
	("es", "es", "Spanish"),
	("de", "de", "German"),
	("it", "it", "Italian"),
	("pt", "pt", "Portuguese"),
	("ko", "ko", "Korean"),
	("jp", "ja", "Japanese"),
	("zh", "zh-CN", "Chinese (Mandarin)"),
	("hi", "hi", "Hindi"),
];

/// WMO weather interpretation codes used by Open-Meteo
#[must_use]
pub const fn weather_emoji(code: u16) -> &'static str {
	match code {
		0 => "☀️",
		1 => "🌤️",
		2 => "⛅",
		3 => "☁️",
		45 | 48 => "🌫️",
		51 | 53 | 61 | 80 => "🌦️",
		55 | 63 | 65 | 81 | 82 => "🌧️",
		71 | 73 | 75 | 77 | 85 | 86 => "❄️",
		95 | 96 | 99 => "⛈️",
		_ => "🌤️",
	}
}

#[must_use]
pub const fn weather_description(code: u16) -> &'static str {
	match code {
		0 => "Clear",
		1 => "Mainly clear",
		2 => "Partly cloudy",
		3 => "Overcast",
		45 => "Fog",
		48 => "Rime fog",
		51 => "Light drizzle",
		53 => "Drizzle",
		55 => "Heavy drizzle",
		61 => "Light rain",
		63 => "Rain",
		65 => "Heavy rain",
		71 | 73 | 75 | 77 => "Snow",
		80 => "Rain showers",
		81 => "Heavy showers",
		82 => "Violent showers",
		85 | 86 => "Snow showers",
		95 => "Thunderstorm",
		96 => "Thunderstorm + hail",
		99 => "Heavy thunderstorm",
		_ => "Unknown",
	}
}

pub const CHATBOT_HELP: &str = "*🤖 Chatbot*\n\n\
.chatbot on/off - _Enable/disable in this chat_\n\
.chatbot on/off groups - _Enable/disable in all groups_\n\
.chatbot on/off dms - _Enable/disable in all DMs_\n\
.chatbot set \"prompt\" - _Set the system prompt_\n\
.chatbot clear - _Clear this chat's context_\n\
.chatbot status - _Show current state_\n\
_Reply to an image to have it described_";
