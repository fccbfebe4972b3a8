//! Fallback templates
//!
//! Hand-written, known-compiling SwiftUI apps used when every repair
//! strategy has failed: trade the broken custom UI for something that
//! definitely builds and launches. Keyed by keywords in the app's name or
//! description.

use crate::source::SourceFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    Timer,
    Counter,
    Calculator,
    Todo,
    Weather,
    Notes,
    Dice,
}

const KEYWORDS: &[(AppKind, &[&str])] = &[
    (AppKind::Timer, &["timer", "stopwatch", "countdown"]),
    (AppKind::Counter, &["counter", "increment", "decrement", "tally"]),
    (AppKind::Calculator, &["calculator", "calculate", "math"]),
    (AppKind::Todo, &["todo", "task", "checklist"]),
    (AppKind::Weather, &["weather", "forecast", "temperature"]),
    (AppKind::Notes, &["note", "memo", "journal"]),
    (AppKind::Dice, &["dice", "roll", "random"]),
];

/// Guess the app kind from free text (name, description, bundle id).
pub fn detect_app_kind(text: &str) -> Option<AppKind> {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(kind, _)| *kind)
}

/// A Swift type name derived from a free-form app name.
pub fn sanitize_type_name(app_name: &str) -> String {
    let cleaned: String = app_name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    let mut name = if cleaned.is_empty() { "My".to_string() } else { cleaned };
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if !name.ends_with("App") {
        name.push_str("App");
    }
    name
}

/// The template for `kind`, instantiated for `app_name`.
pub fn template_files(kind: AppKind, app_name: &str) -> Vec<SourceFile> {
    let content_view = match kind {
        AppKind::Timer => TIMER_VIEW,
        AppKind::Counter => COUNTER_VIEW,
        AppKind::Calculator => CALCULATOR_VIEW,
        AppKind::Todo => TODO_VIEW,
        AppKind::Weather => WEATHER_VIEW,
        AppKind::Notes => NOTES_VIEW,
        AppKind::Dice => DICE_VIEW,
    };
    build(app_name, content_view)
}

/// The bare minimum that compiles: used when no template matches.
pub fn minimal_app_files(app_name: &str) -> Vec<SourceFile> {
    build(app_name, MINIMAL_VIEW)
}

fn build(app_name: &str, content_view: &str) -> Vec<SourceFile> {
    let type_name = sanitize_type_name(app_name);
    vec![
        SourceFile::new(
            "Sources/App.swift",
            APP_SHELL.replace("{{APP_TYPE}}", &type_name),
        ),
        SourceFile::new("Sources/ContentView.swift", content_view.to_string()),
    ]
}

const APP_SHELL: &str = r#"import SwiftUI

@main
struct {{APP_TYPE}}: App {
    var body: some Scene {
        WindowGroup {
            ContentView()
        }
    }
}
"#;

const MINIMAL_VIEW: &str = r#"import SwiftUI

struct ContentView: View {
    var body: some View {
        VStack {
            Image(systemName: "globe")
                .imageScale(.large)
                .foregroundColor(.accentColor)
            Text("Hello, world!")
        }
        .padding()
    }
}
"#;

const COUNTER_VIEW: &str = r#"import SwiftUI

struct ContentView: View {
    @State private var count = 0

    var body: some View {
        VStack(spacing: 30) {
            Text("\(count)")
                .font(.system(size: 80, weight: .bold, design: .rounded))

            HStack(spacing: 40) {
                Button(action: { count -= 1 }) {
                    Image(systemName: "minus.circle.fill")
                        .font(.system(size: 50))
                        .foregroundColor(.red)
                }

                Button(action: { count += 1 }) {
                    Image(systemName: "plus.circle.fill")
                        .font(.system(size: 50))
                        .foregroundColor(.green)
                }
            }

            Button("Reset") { count = 0 }
                .foregroundColor(.secondary)
        }
        .padding()
    }
}
"#;

const TIMER_VIEW: &str = r#"import SwiftUI

struct ContentView: View {
    @State private var elapsed: TimeInterval = 0
    @State private var isRunning = false

    let timer = Timer.publish(every: 0.1, on: .main, in: .common).autoconnect()

    var body: some View {
        VStack(spacing: 40) {
            Text(formatted)
                .font(.system(size: 60, weight: .medium, design: .monospaced))

            HStack(spacing: 30) {
                Button(isRunning ? "Stop" : "Start") {
                    isRunning.toggle()
                }
                .font(.title2)
                .buttonStyle(.borderedProminent)
                .tint(isRunning ? .red : .green)

                Button("Reset") {
                    isRunning = false
                    elapsed = 0
                }
                .font(.title2)
                .buttonStyle(.bordered)
            }
        }
        .padding()
        .onReceive(timer) { _ in
            if isRunning {
                elapsed += 0.1
            }
        }
    }

    private var formatted: String {
        let minutes = Int(elapsed) / 60
        let seconds = Int(elapsed) % 60
        let tenths = Int(elapsed * 10) % 10
        return String(format: "%02d:%02d.%d", minutes, seconds, tenths)
    }
}
"#;

const CALCULATOR_VIEW: &str = r#"import SwiftUI

struct ContentView: View {
    @State private var display = "0"
    @State private var accumulator: Double = 0
    @State private var pendingOperation: String? = nil
    @State private var startsNewNumber = true

    private let rows: [[String]] = [
        ["7", "8", "9", "/"],
        ["4", "5", "6", "*"],
        ["1", "2", "3", "-"],
        ["0", "C", "=", "+"]
    ]

    var body: some View {
        VStack(spacing: 12) {
            Spacer()
            Text(display)
                .font(.system(size: 64, weight: .light, design: .rounded))
                .frame(maxWidth: .infinity, alignment: .trailing)
                .padding(.horizontal)

            ForEach(rows, id: \.self) { row in
                HStack(spacing: 12) {
                    ForEach(row, id: \.self) { key in
                        Button(action: { tap(key) }) {
                            Text(key)
                                .font(.title)
                                .frame(maxWidth: .infinity, minHeight: 64)
                        }
                        .buttonStyle(.bordered)
                    }
                }
            }
        }
        .padding()
    }

    private func tap(_ key: String) {
        switch key {
        case "0", "1", "2", "3", "4", "5", "6", "7", "8", "9":
            if startsNewNumber {
                display = key
                startsNewNumber = false
            } else {
                display += key
            }
        case "C":
            display = "0"
            accumulator = 0
            pendingOperation = nil
            startsNewNumber = true
        case "=":
            applyPending()
            pendingOperation = nil
            startsNewNumber = true
        default:
            applyPending()
            pendingOperation = key
            startsNewNumber = true
        }
    }

    private func applyPending() {
        let current = Double(display) ?? 0
        guard let operation = pendingOperation else {
            accumulator = current
            return
        }
        switch operation {
        case "+": accumulator += current
        case "-": accumulator -= current
        case "*": accumulator *= current
        case "/": accumulator = current == 0 ? 0 : accumulator / current
        default: break
        }
        display = accumulator.truncatingRemainder(dividingBy: 1) == 0
            ? String(Int(accumulator))
            : String(accumulator)
    }
}
"#;

const TODO_VIEW: &str = r#"import SwiftUI

struct TodoItem: Identifiable {
    let id = UUID()
    var title: String
    var isCompleted = false
}

struct ContentView: View {
    @State private var todos: [TodoItem] = []
    @State private var newTitle = ""

    var body: some View {
        NavigationStack {
            List {
                ForEach(todos) { todo in
                    HStack {
                        Button(action: { toggle(todo) }) {
                            Image(systemName: todo.isCompleted ? "checkmark.circle.fill" : "circle")
                                .foregroundColor(todo.isCompleted ? .green : .gray)
                        }
                        Text(todo.title)
                            .strikethrough(todo.isCompleted)
                            .foregroundColor(todo.isCompleted ? .gray : .primary)
                    }
                }
                .onDelete { todos.remove(atOffsets: $0) }
            }
            .navigationTitle("Todos")
            .safeAreaInset(edge: .bottom) {
                HStack {
                    TextField("New todo", text: $newTitle)
                        .textFieldStyle(.roundedBorder)
                    Button("Add") {
                        let trimmed = newTitle.trimmingCharacters(in: .whitespaces)
                        guard !trimmed.isEmpty else { return }
                        todos.append(TodoItem(title: trimmed))
                        newTitle = ""
                    }
                    .buttonStyle(.borderedProminent)
                }
                .padding()
                .background(.thinMaterial)
            }
        }
    }

    private func toggle(_ todo: TodoItem) {
        if let index = todos.firstIndex(where: { $0.id == todo.id }) {
            todos[index].isCompleted.toggle()
        }
    }
}
"#;

const WEATHER_VIEW: &str = r#"import SwiftUI

struct DayForecast: Identifiable {
    let id = UUID()
    let day: String
    let symbol: String
    let high: Int
    let low: Int
}

struct ContentView: View {
    private let forecast: [DayForecast] = [
        DayForecast(day: "Monday", symbol: "sun.max.fill", high: 24, low: 15),
        DayForecast(day: "Tuesday", symbol: "cloud.sun.fill", high: 21, low: 14),
        DayForecast(day: "Wednesday", symbol: "cloud.rain.fill", high: 17, low: 12),
        DayForecast(day: "Thursday", symbol: "cloud.fill", high: 19, low: 13),
        DayForecast(day: "Friday", symbol: "sun.max.fill", high: 25, low: 16)
    ]

    var body: some View {
        NavigationStack {
            List(forecast) { day in
                HStack {
                    Image(systemName: day.symbol)
                        .foregroundColor(.orange)
                        .frame(width: 36)
                    Text(day.day)
                    Spacer()
                    Text("\(day.high)° / \(day.low)°")
                        .foregroundColor(.secondary)
                }
            }
            .navigationTitle("Weather")
        }
    }
}
"#;

const NOTES_VIEW: &str = r#"import SwiftUI

struct Note: Identifiable {
    let id = UUID()
    var text: String
    let createdAt = Date()
}

struct ContentView: View {
    @State private var notes: [Note] = []
    @State private var draft = ""

    var body: some View {
        NavigationStack {
            List {
                ForEach(notes) { note in
                    VStack(alignment: .leading, spacing: 4) {
                        Text(note.text)
                        Text(note.createdAt, style: .date)
                            .font(.caption)
                            .foregroundColor(.secondary)
                    }
                }
                .onDelete { notes.remove(atOffsets: $0) }
            }
            .navigationTitle("Notes")
            .safeAreaInset(edge: .bottom) {
                HStack {
                    TextField("Write a note", text: $draft)
                        .textFieldStyle(.roundedBorder)
                    Button("Save") {
                        let trimmed = draft.trimmingCharacters(in: .whitespaces)
                        guard !trimmed.isEmpty else { return }
                        notes.insert(Note(text: trimmed), at: 0)
                        draft = ""
                    }
                    .buttonStyle(.borderedProminent)
                }
                .padding()
                .background(.thinMaterial)
            }
        }
    }
}
"#;

const DICE_VIEW: &str = r#"import SwiftUI

struct ContentView: View {
    @State private var value = 1
    @State private var isRolling = false

    var body: some View {
        VStack(spacing: 40) {
            Image(systemName: "die.face.\(value).fill")
                .font(.system(size: 140))
                .foregroundColor(.red)
                .rotationEffect(.degrees(isRolling ? 360 : 0))
                .animation(.easeOut(duration: 0.4), value: isRolling)

            Button("Roll") {
                isRolling.toggle()
                value = Int.random(in: 1...6)
            }
            .font(.title)
            .buttonStyle(.borderedProminent)
        }
        .padding()
    }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair::delimiters::validate_balance;

    #[test]
    fn test_keyword_detection() {
        assert_eq!(detect_app_kind("A simple countdown timer"), Some(AppKind::Timer));
        assert_eq!(detect_app_kind("Tally counter"), Some(AppKind::Counter));
        assert_eq!(detect_app_kind("basic calculator"), Some(AppKind::Calculator));
        assert_eq!(detect_app_kind("My TODO list"), Some(AppKind::Todo));
        assert_eq!(detect_app_kind("weather forecast"), Some(AppKind::Weather));
        assert_eq!(detect_app_kind("quick notes"), Some(AppKind::Notes));
        assert_eq!(detect_app_kind("dice roller"), Some(AppKind::Dice));
        assert_eq!(detect_app_kind("flight tracker"), None);
    }

    #[test]
    fn test_sanitize_type_name() {
        assert_eq!(sanitize_type_name("my counter"), "MyCounterApp");
        assert_eq!(sanitize_type_name("Timer App"), "TimerApp");
        assert_eq!(sanitize_type_name("2048"), "_2048App");
        assert_eq!(sanitize_type_name(""), "MyApp");
    }

    #[test]
    fn test_every_template_is_balanced() {
        let kinds = [
            AppKind::Timer,
            AppKind::Counter,
            AppKind::Calculator,
            AppKind::Todo,
            AppKind::Weather,
            AppKind::Notes,
            AppKind::Dice,
        ];
        for kind in kinds {
            for file in template_files(kind, "Sample") {
                let issues = validate_balance(&file.content);
                assert!(issues.is_empty(), "{:?} {} has {:?}", kind, file.path, issues);
            }
        }
        for file in minimal_app_files("Sample") {
            assert!(validate_balance(&file.content).is_empty());
        }
    }

    #[test]
    fn test_templates_have_entry_point_and_content_view() {
        let files = template_files(AppKind::Counter, "tally counter");
        assert_eq!(files.len(), 2);
        assert!(files[0].is_entry_point());
        assert!(files[0].content.contains("struct TallyCounterApp: App"));
        assert!(files[1].content.contains("struct ContentView: View"));
    }
}
