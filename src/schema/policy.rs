use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyCommand {
    Select,
    Insert,
    Update,
    Delete,
}

impl PolicyCommand {
    /// Commands granted to the service role on every table.
    pub const WRITES: [Self; 3] = [Self::Insert, Self::Update, Self::Delete];

    fn clause(self) -> &'static str {
        match self {
            Self::Select => "FOR SELECT USING (true)",
            Self::Insert => "FOR INSERT WITH CHECK (true)",
            Self::Update => "FOR UPDATE USING (true)",
            Self::Delete => "FOR DELETE USING (true)",
        }
    }
}

impl fmt::Display for PolicyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// A row-level security policy on one table.
///
/// `Select` policies are the public read policy; the write commands are the
/// service-role policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Policy {
    pub table: &'static str,
    pub command: PolicyCommand,
}

impl Policy {
    pub fn public_read(table: &'static str) -> Self {
        Self {
            table,
            command: PolicyCommand::Select,
        }
    }

    pub fn service_write(table: &'static str, command: PolicyCommand) -> Self {
        Self { table, command }
    }

    /// The read policy followed by the three write policies for `table`.
    pub fn for_table(table: &'static str) -> [Self; 4] {
        let [insert, update, delete] =
            PolicyCommand::WRITES.map(|command| Self::service_write(table, command));
        [Self::public_read(table), insert, update, delete]
    }

    #[must_use]
    pub fn is_read(&self) -> bool {
        self.command == PolicyCommand::Select
    }

    pub fn name(&self) -> String {
        if self.is_read() {
            format!("public_read_{}", self.table)
        } else {
            format!("service_{}_{}", self.command, self.table)
        }
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP POLICY IF EXISTS \"{}\" ON {}", self.name(), self.table)
    }

    pub fn create_sql(&self) -> String {
        format!(
            "CREATE POLICY \"{}\" ON {} {}",
            self.name(),
            self.table,
            self.command.clause()
        )
    }
}
