//! Per-intent handlers and their bilingual replies

use chrono::Local;

use crate::Error;
use crate::capabilities::{
    DeviceCommand, DeviceControl, EventTrigger, FileStore, KnowledgeSource, SystemLifecycle,
    TaskStore,
};
use crate::intent::{Intent, Params};
use crate::lifecycle::{ConfirmOutcome, LifecycleAction, LifecycleDecision, Origin};
use crate::locale::Reply;
use crate::memory::MemoryStore;

/// How much of a file is read back
const READ_PREVIEW_CHARS: usize = 200;

fn apology(context: &str, err: &Error) -> Reply {
    tracing::warn!(error = %err, context, "capability call failed");
    Reply::new("סליחה, משהו השתבש", "Sorry, something went wrong")
}

/// Specific reply for `NotFound`, generic apology for anything else
fn failure(context: &str, err: &Error, not_found: impl FnOnce() -> Reply) -> Reply {
    match err {
        Error::NotFound(_) => {
            tracing::info!(error = %err, context, "capability target not found");
            not_found()
        }
        _ => apology(context, err),
    }
}

pub fn get_time() -> Reply {
    let now = Local::now().format("%H:%M").to_string();
    Reply::new(format!("השעה עכשיו {now}"), format!("The time is now {now}"))
}

pub fn get_date() -> Reply {
    let today = Local::now().format("%A, %B %d").to_string();
    Reply::new(format!("היום {today}"), format!("Today is {today}"))
}

pub fn get_weather(p: &Params) -> Reply {
    let (he, en) = p
        .str("location")
        .map_or(("המיקום שלך", "your location"), |l| (l, l));
    Reply::new(
        format!("מזג האוויר ב־{he} הוא שמשי ונעים"),
        format!("The weather in {en} is sunny and pleasant"),
    )
}

enum DeviceRequest {
    Ready(DeviceCommand),
    NeedsValue,
    Unsupported,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn device_request(action: &str, value: Option<f64>) -> DeviceRequest {
    match (action, value) {
        ("on", _) => DeviceRequest::Ready(DeviceCommand::On),
        ("off", _) => DeviceRequest::Ready(DeviceCommand::Off),
        ("toggle", _) => DeviceRequest::Ready(DeviceCommand::Toggle),
        ("set_brightness", Some(v)) => {
            DeviceRequest::Ready(DeviceCommand::Brightness(v.round().clamp(0.0, 255.0) as u8))
        }
        ("set_temperature", Some(v)) => DeviceRequest::Ready(DeviceCommand::Temperature(v)),
        ("set_brightness" | "set_temperature", None) => DeviceRequest::NeedsValue,
        _ => DeviceRequest::Unsupported,
    }
}

pub async fn control_device(devices: &dyn DeviceControl, p: &Params) -> Reply {
    let (Some(device), Some(action)) = (p.str("device"), p.str("action")) else {
        return Reply::new("יש לציין שם התקן ופעולה", "Please specify device and action");
    };

    let command = match device_request(&action.to_lowercase(), p.number("value")) {
        DeviceRequest::Ready(command) => command,
        DeviceRequest::NeedsValue => {
            return Reply::new(
                format!("לאיזה ערך לכוון את {device}?"),
                format!("What value should I set {device} to?"),
            );
        }
        DeviceRequest::Unsupported => {
            return Reply::new(
                format!("אני לא יודע איך לבצע '{action}' על {device}"),
                format!("I don't know how to '{action}' {device}"),
            );
        }
    };

    match devices.control(device, command).await {
        Ok(()) => match command {
            DeviceCommand::On => Reply::new(format!("{device} הופעל"), format!("{device} turned on")),
            DeviceCommand::Off => Reply::new(format!("{device} כובה"), format!("{device} turned off")),
            DeviceCommand::Toggle => {
                Reply::new(format!("{device} הוחלף"), format!("{device} toggled"))
            }
            DeviceCommand::Brightness(level) => Reply::new(
                format!("הבהירות של {device} כוונה ל־{level}"),
                format!("{device} brightness set to {level}"),
            ),
            DeviceCommand::Temperature(degrees) => Reply::new(
                format!("{device} כוון ל־{degrees} מעלות"),
                format!("{device} set to {degrees} degrees"),
            ),
        },
        Err(e) => failure("control_device", &e, || {
            Reply::new(
                format!("לא מצאתי התקן בשם {device}"),
                format!("I don't know a device called {device}"),
            )
        }),
    }
}

pub async fn add_to_list(files: &dyn FileStore, p: &Params) -> Reply {
    let Some(item) = p.str("item") else {
        return Reply::new("מה להוסיף לרשימה?", "What should I add to the list?");
    };
    match files.add_to_list(item).await {
        Ok(()) => Reply::new(format!("{item} נוסף לרשימה"), format!("{item} added to list")),
        Err(e) => apology("add_to_list", &e),
    }
}

pub async fn remove_from_list(files: &dyn FileStore, p: &Params) -> Reply {
    let Some(item) = p.str("item") else {
        return Reply::new("מה להסיר מהרשימה?", "What should I remove from the list?");
    };
    match files.remove_from_list(item).await {
        Ok(()) => Reply::new(format!("{item} הוסר מהרשימה"), format!("{item} removed from list")),
        Err(e) => failure("remove_from_list", &e, || {
            Reply::new(format!("{item} לא נמצא ברשימה"), format!("{item} is not on the list"))
        }),
    }
}

pub async fn create_task(tasks: &dyn TaskStore, p: &Params) -> Reply {
    let (Some(description), Some(when)) = (p.str("description"), p.str("when")) else {
        return Reply::new("יש לציין תיאור משימה וזמן", "Please specify the task and when");
    };
    match tasks.create_task(description, when).await {
        Ok(()) => Reply::new(
            format!("יצרתי משימה: {description} ל־{when}"),
            format!("Created task: {description} at {when}"),
        ),
        Err(e) => apology("create_task", &e),
    }
}

pub async fn cancel_task(tasks: &dyn TaskStore, p: &Params) -> Reply {
    let Some(description) = p.str("description") else {
        return Reply::new("איזו משימה למחוק?", "Which task should I delete?");
    };
    match tasks.cancel_task(description).await {
        Ok(()) => Reply::new(
            format!("מחקתי את המשימה: {description}"),
            format!("Deleted task: {description}"),
        ),
        Err(e) => failure("cancel_task", &e, || {
            Reply::new(
                format!("לא מצאתי משימה בשם {description}"),
                format!("I couldn't find a task called {description}"),
            )
        }),
    }
}

pub async fn ask_memory(
    memory: &MemoryStore,
    knowledge: Option<&dyn KnowledgeSource>,
    p: &Params,
) -> Reply {
    let Some(topic) = p.str("topic") else {
        return Reply::new("על מה לחפש בזיכרון?", "What should I look up?");
    };

    if let Some(content) = memory.retrieve(topic) {
        return Reply::verbatim(content);
    }

    let Some(knowledge) = knowledge else {
        return Reply::new(
            format!("לא שמרתי שום דבר על {topic}"),
            format!("I have nothing saved about {topic}"),
        );
    };

    match knowledge.answer(&format!("Who is {topic}?")).await {
        Ok(answer) if !answer.trim().is_empty() => Reply::verbatim(answer),
        Ok(_) => Reply::new("לא הצלחתי למצוא תשובה", "I couldn't find an answer"),
        Err(e) => {
            tracing::warn!(error = %e, topic, "knowledge fallback failed");
            Reply::new("לא הצלחתי למצוא תשובה", "I couldn't find an answer")
        }
    }
}

pub fn save_memory(memory: &MemoryStore, p: &Params) -> Reply {
    let (Some(topic), Some(content)) = (p.str("topic"), p.str("content")) else {
        return Reply::new(
            "יש לציין נושא ותוכן לשמירה",
            "Please specify what to remember and under which topic",
        );
    };
    memory.save(topic, content);
    Reply::new("שמרתי את זה בזיכרון", "Saved to memory")
}

fn invalid_file_name(name: &str) -> Reply {
    Reply::new(
        format!("'{name}' אינו שם קובץ תקין"),
        format!("'{name}' is not a valid file name"),
    )
}

pub async fn read_file(files: &dyn FileStore, p: &Params) -> Reply {
    let Some(name) = p.str("filename") else {
        return Reply::new("איזה קובץ לקרוא?", "Which file should I read?");
    };
    match files.read(name).await {
        Ok(content) => {
            let preview: String = content.chars().take(READ_PREVIEW_CHARS).collect();
            Reply::new(format!("התוכן הוא: {preview}"), format!("The content is: {preview}"))
        }
        Err(Error::InvalidInput(_)) => invalid_file_name(name),
        Err(e) => failure("read_file", &e, || {
            Reply::new(
                format!("לא מצאתי קובץ בשם {name}"),
                format!("I couldn't find a file called {name}"),
            )
        }),
    }
}

pub async fn write_file(files: &dyn FileStore, p: &Params) -> Reply {
    let (Some(name), Some(content)) = (p.str("filename"), p.str("content")) else {
        return Reply::new("יש לציין שם קובץ ותוכן", "Please specify a file name and content");
    };
    match files.write(name, content).await {
        Ok(()) => Reply::new("קובץ עודכן", "File updated"),
        Err(Error::InvalidInput(_)) => invalid_file_name(name),
        Err(e) => apology("write_file", &e),
    }
}

pub fn tell_joke() -> Reply {
    Reply::new(
        "למה שלדים לא נלחמים אחד בשני? כי אין להם אומץ!",
        "Why don't skeletons fight each other? They don't have the guts!",
    )
}

pub fn tell_fact() -> Reply {
    Reply::new("ידעת שלתמנון יש שלושה לבבות?", "Did you know an octopus has three hearts?")
}

pub fn generate_idea() -> Reply {
    Reply::new(
        "רעיון: לבנות מראה חכמה שמדברת איתך",
        "Idea: build a smart mirror that talks to you",
    )
}

pub fn get_status() -> Reply {
    Reply::new("כל המערכות פועלות כראוי", "All systems are operational")
}

pub async fn run_ifttt(events: &dyn EventTrigger, p: &Params) -> Reply {
    let Some(event) = p.str("event") else {
        return Reply::new("איזה אירוע IFTTT להפעיל?", "Which IFTTT event should I trigger?");
    };
    match events.trigger(event, p.str("value1")).await {
        Ok(()) => Reply::new("אירוע IFTTT הופעל", "IFTTT event triggered"),
        Err(e) => apology("run_ifttt", &e),
    }
}

pub fn switch_mode(p: &Params) -> Reply {
    let Some(mode) = p.str("mode") else {
        return Reply::new("לאיזה מצב לעבור?", "Which mode should I switch to?");
    };
    Reply::new(
        format!("עובר למצב {mode}... (טרם נתמך)"),
        format!("Switching to mode {mode}... (not yet supported)"),
    )
}

pub fn ask_buddy() -> Reply {
    Reply::new("אני מקשיב, בוא נדבר על זה", "I'm listening, let's talk about it")
}

pub async fn set_reminder(tasks: &dyn TaskStore, p: &Params) -> Reply {
    let (Some(message), Some(when)) = (p.str("message"), p.str("when")) else {
        return Reply::new("יש לציין תזכורת וזמן", "Please specify the reminder and when");
    };
    match tasks.create_task(message, when).await {
        Ok(()) => Reply::new(
            format!("תזכורת נקבעה ל־{when}: {message}"),
            format!("Reminder set for {when}: {message}"),
        ),
        Err(e) => apology("set_reminder", &e),
    }
}

pub fn play_music(p: &Params) -> Reply {
    let (he, en) = p
        .str("song")
        .map_or(("שיר מרגיע", "a relaxing song"), |s| (s, s));
    Reply::new(
        format!("מנגן {he}... (תמיכה תגיע בהמשך)"),
        format!("Playing {en}... (support coming soon)"),
    )
}

pub fn ask_health(p: &Params) -> Reply {
    let Some(issue) = p.str("issue") else {
        return Reply::new("מה מטריד אותך?", "What's bothering you?");
    };
    Reply::new(
        format!("אני לא רופא, אבל הנה מה שמצאתי על {issue}..."),
        format!("I'm not a doctor, but here's what I found about {issue}..."),
    )
}

pub fn debug_diagnostics() -> Reply {
    Reply::new("מריץ אבחון מערכתי...", "Running diagnostics...")
}

pub fn translate(p: &Params) -> Reply {
    let (Some(text), Some(target)) = (p.str("text"), p.str("target_lang")) else {
        return Reply::new("יש לציין טקסט ושפת יעד", "Please specify the text and target language");
    };
    Reply::new(
        format!("מתרגם '{text}' ל־{target}..."),
        format!("Translating '{text}' to {target}..."),
    )
}

const fn lifecycle_action(intent: Intent) -> Option<LifecycleAction> {
    match intent {
        Intent::Exit => Some(LifecycleAction::Exit),
        Intent::Restart => Some(LifecycleAction::Restart),
        Intent::ShutdownSystem => Some(LifecycleAction::Shutdown),
        Intent::RebootSystem => Some(LifecycleAction::Reboot),
        _ => None,
    }
}

const fn action_phrase(action: LifecycleAction) -> (&'static str, &'static str) {
    match action {
        LifecycleAction::Exit => ("לצאת", "exit"),
        LifecycleAction::Restart => ("לאתחל את זיגי", "restart"),
        LifecycleAction::Shutdown => ("לכבות את המערכת", "shut down the system"),
        LifecycleAction::Reboot => ("להפעיל מחדש את המערכת", "reboot the system"),
    }
}

pub fn request_lifecycle(lifecycle: &dyn SystemLifecycle, intent: Intent, origin: &Origin) -> Reply {
    let Some(action) = lifecycle_action(intent) else {
        return unknown();
    };

    match lifecycle.request(action, origin) {
        LifecycleDecision::AwaitingConfirmation { action, window } => {
            let (he, en) = action_phrase(action);
            let secs = window.as_secs();
            Reply::new(
                format!("האם {he}? אמור 'אשר' תוך {secs} שניות"),
                format!("Are you sure you want to {en}? Say 'confirm' within {secs} seconds"),
            )
        }
        LifecycleDecision::Refused(_) => Reply::new(
            "כיבוי והפעלה מחדש של המחשב אינם מורשים",
            "Shutting down or rebooting the host is not allowed",
        ),
    }
}

pub fn confirm_action(lifecycle: &dyn SystemLifecycle, origin: &Origin) -> Reply {
    match lifecycle.confirm(origin) {
        ConfirmOutcome::Confirmed(LifecycleAction::Exit) => Reply::new("להתראות", "Goodbye"),
        ConfirmOutcome::Confirmed(LifecycleAction::Restart) => {
            Reply::new("מאתחל...", "Restarting...")
        }
        ConfirmOutcome::Confirmed(LifecycleAction::Shutdown) => {
            Reply::new("מכבה את המערכת...", "Shutting down the system...")
        }
        ConfirmOutcome::Confirmed(LifecycleAction::Reboot) => {
            Reply::new("מאתחל את המערכת...", "Rebooting the system...")
        }
        ConfirmOutcome::Expired(_) => Reply::new(
            "פג הזמן לאישור, בקש שוב",
            "The confirmation window expired, please ask again",
        ),
        ConfirmOutcome::NothingPending => {
            Reply::new("אין פעולה שממתינה לאישור", "There is nothing to confirm")
        }
    }
}

pub fn unknown() -> Reply {
    Reply::new("לא הבנתי את הבקשה", "I didn't understand the request")
}
