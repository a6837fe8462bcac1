use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use crossterm::event::KeyCode;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DateTimePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
}

impl DateTimePart {
    fn digits(self) -> usize {
        match self {
            DateTimePart::Year => 4,
            _ => 2,
        }
    }
}

/// Optional local date and time edited one part at a time. Typing a digit on
/// an empty value starts from the current minute; Delete clears it again.
pub struct DateTimeInputState {
    pub value: Option<NaiveDateTime>,
    pub part: DateTimePart,
    pub buffer: String,
}

impl DateTimeInputState {
    pub fn new() -> Self {
        Self {
            value: None,
            part: DateTimePart::Year,
            buffer: String::new(),
        }
    }

    pub fn next_part(&mut self) {
        self.part = match self.part {
            DateTimePart::Year => DateTimePart::Month,
            DateTimePart::Month => DateTimePart::Day,
            DateTimePart::Day => DateTimePart::Hour,
            DateTimePart::Hour => DateTimePart::Minute,
            DateTimePart::Minute => DateTimePart::Year,
        };
        self.buffer.clear();
    }

    pub fn previous_part(&mut self) {
        self.part = match self.part {
            DateTimePart::Year => DateTimePart::Minute,
            DateTimePart::Month => DateTimePart::Year,
            DateTimePart::Day => DateTimePart::Month,
            DateTimePart::Hour => DateTimePart::Day,
            DateTimePart::Minute => DateTimePart::Hour,
        };
        self.buffer.clear();
    }

    pub fn clear(&mut self) {
        self.value = None;
        self.part = DateTimePart::Year;
        self.buffer.clear();
    }

    pub fn handle_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.value.is_none() {
                    self.value = Some(current_minute());
                }
                self.buffer.push(c);
                if self.buffer.len() == self.part.digits() {
                    if let Ok(number) = self.buffer.parse::<u32>() {
                        self.apply(number);
                    }
                    self.next_part();
                }
            }
            KeyCode::Backspace => {
                self.buffer.pop();
            }
            KeyCode::Delete => self.clear(),
            KeyCode::Right => self.next_part(),
            KeyCode::Left => self.previous_part(),
            _ => {}
        }
    }

    fn apply(&mut self, number: u32) {
        let Some(current) = self.value else {
            return;
        };
        let (mut year, mut month, mut day) = (current.year(), current.month(), current.day());
        let (mut hour, mut minute) = (current.hour(), current.minute());

        match self.part {
            DateTimePart::Year if (1900..=2100).contains(&number) => year = number as i32,
            DateTimePart::Month if (1..=12).contains(&number) => month = number,
            DateTimePart::Day if number >= 1 && number <= days_in_month(year, month) => day = number,
            DateTimePart::Hour if number < 24 => hour = number,
            DateTimePart::Minute if number < 60 => minute = number,
            _ => return,
        }
        day = day.min(days_in_month(year, month));

        if let Some(updated) = NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(hour, minute, 0)) {
            self.value = Some(updated);
        }
    }

    /// The value interpreted in the local time zone.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        let naive = self.value?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }

    pub fn get_display_string(&self, editing: bool) -> String {
        let Some(value) = self.value else {
            return if editing {
                "[type digits to set a due date]".to_string()
            } else {
                "No due date".to_string()
            };
        };

        let parts = [
            (DateTimePart::Year, format!("{:04}", value.year())),
            (DateTimePart::Month, format!("{:02}", value.month())),
            (DateTimePart::Day, format!("{:02}", value.day())),
            (DateTimePart::Hour, format!("{:02}", value.hour())),
            (DateTimePart::Minute, format!("{:02}", value.minute())),
        ];
        let rendered: Vec<String> = parts
            .into_iter()
            .map(|(part, text)| {
                if editing && part == self.part {
                    if self.buffer.is_empty() {
                        format!("[{text}]")
                    } else {
                        format!("[{}]", self.buffer)
                    }
                } else {
                    text
                }
            })
            .collect();

        format!(
            "{}-{}-{} {}:{}",
            rendered[0], rendered[1], rendered[2], rendered[3], rendered[4]
        )
    }
}

impl Default for DateTimeInputState {
    fn default() -> Self {
        Self::new()
    }
}

fn current_minute() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}
